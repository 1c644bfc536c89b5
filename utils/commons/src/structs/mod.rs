use super::*;

mod percentage;
mod token;

pub use self::{percentage::*, token::*};
