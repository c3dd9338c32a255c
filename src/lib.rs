// SPDX-License-Identifier: MIT

//! Bundle many workflow values into one opaque token and unpack them later.

pub mod common;
pub mod warp;
