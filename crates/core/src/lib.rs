//! Core of PhraseLens: extraction records, the analytics aggregation
//! pipeline, history browsing, and the ports the adapters implement.

pub mod analytics;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod gate;
pub mod history;
pub mod payload;
pub mod ports;
pub mod utils;
pub mod view;

pub use domain::{
    AnalyticsReport, AnalyticsSnapshot, DailyUsage, DateWindow, Extraction, ExtractionRecord,
    PhraseCount, NO_DATA, TOP_N,
};
pub use error::{Error, ExtractError};
