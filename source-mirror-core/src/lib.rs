#![doc = "source-mirror-core: core logic library for source-mirror."]

//! This crate lists a hosted deployment's source tree through the file-tree API
//! and mirrors it onto the local filesystem.
//!
//! # Usage
//! Build a [`config::MirrorConfig`] and call [`mirror::mirror_deployment`], or
//! drive [`mirror::run`] with your own [`contract::TreeFetcher`] and
//! [`contract::ContentFetcher`] implementations.

pub mod client;
pub mod config;
pub mod contract;
pub mod error;
pub mod mirror;
pub mod path;
pub mod retrieve;
