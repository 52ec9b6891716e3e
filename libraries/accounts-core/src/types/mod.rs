mod ids;
mod token;
mod user;

pub use ids::UserId;
pub use token::Token;
pub use user::{NewUser, User, UserChanges, UNUSABLE_PASSWORD_PREFIX};
