//! Dream Flow: guided wizards for a dream journal: onboarding quiz,
//! paywall, and biorhythm analysis.

pub mod biorhythm;
pub mod capabilities;
pub mod cli;
pub mod config;
pub mod error;
pub mod flow;
pub mod onboarding;
pub mod paywall;
pub mod scoring;
pub mod store;
