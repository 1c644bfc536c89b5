//! Building blocks shared by the auction house contracts: the rejection type,
//! authority management, fixed-point percentages and CIS-2 token helpers.
#![cfg_attr(not(feature = "std"), no_std)]
pub use crate::{authority::*, constants::*, errors::*, structs::*, types::*};
use concordium_cis2::*;
use concordium_std::*;

pub mod test;

mod authority;
mod constants;
mod errors;
mod structs;
mod types;
