//! Wiper engine: drives a live page through discovery, the per-message
//! wipe-and-delete sequence and pagination.
mod chrome;
mod controller;
mod locator;
mod page;
mod pagination;
mod progress;
mod resolver;
mod sequencer;
mod session;
mod settle;
mod snapshot;
mod strategy;
mod types;

pub mod report;

pub use chrome::{ChromePage, ChromeSession, LaunchSettings, DEFAULT_START_URL};
pub use controller::{RunController, RunOutcome};
pub use locator::MessageLocator;
pub use page::{ElementHandle, Page, PageError, Scope};
pub use pagination::PaginationDriver;
pub use progress::{ChannelProgressSink, NullProgressSink, ProgressSink};
pub use report::{write_report, ReportError, RunReport};
pub use resolver::SelectorResolver;
pub use sequencer::{InteractionSequencer, WIPE_PLACEHOLDER};
pub use session::{navigate, wait_for_login, LoginWait};
pub use settle::{settle, SettlePolicy};
pub use snapshot::{SnapshotEvent, SnapshotPage};
pub use strategy::{
    select_strategy, DiscoveryStrategy, ScanStrategy, SearchSession, SearchStrategy,
};
pub use types::{EngineEvent, MessageHandle, MessageReport, WipeError};
