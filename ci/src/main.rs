//! CI script used for Waitline.
//!
//! Adapted from the bevy CI tool.

mod ci;
mod commands;
mod prepare;

pub use self::{ci::*, prepare::*};

fn main() {
    argh::from_env::<CI>().run();
}
