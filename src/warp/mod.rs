// SPDX-License-Identifier: MIT

pub mod bundle;
pub mod nodes;
pub mod pipeline;
pub mod samplers;
