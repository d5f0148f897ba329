//! Offscreen frame listeners: conversion into an invisible target, readback,
//! and delivery of tightly packed bytes.

mod listener;
mod mailbox;
mod offscreen;
mod readback;

pub use listener::{Delivery, FrameListener, FrameView, ListenerId};
pub use offscreen::ReaderSpec;
pub use readback::{depad_rows, padded_bytes_per_row};

pub(crate) use listener::panic_message;
pub(crate) use offscreen::OffscreenReader;
