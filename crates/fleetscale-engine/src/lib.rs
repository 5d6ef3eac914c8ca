//! FleetScale automation engine
//!
//! A small remote-execution engine: hosts are registered on an [`Engine`]
//! session and every operation (file, stat, copy, command, package, facts,
//! reachability) is fanned out to all of them concurrently over SSH.
//!
//! ```ignore
//! use fleetscale_engine::{Automation, Engine, FileState, HostTarget, SshTransport};
//!
//! let mut engine = Engine::new(SshTransport::new()?);
//! engine.add_host(HostTarget::new("ftl2-scale-0", "203.0.113.10", "root"));
//! engine.file("/tmp/marker", FileState::Touch).await?;
//! engine.close().await?;
//! ```

pub mod engine;
pub mod error;
pub mod host;
pub mod ops;
pub mod transport;
pub mod waiter;

pub use engine::{Automation, Engine};
pub use error::{EngineError, HostFailure, Result};
pub use host::{HostOutput, HostTarget};
pub use ops::{Facts, FileStat, FileState, PackageState};
pub use transport::{ExecOutput, SshTransport, Transport, shell_escape};
pub use waiter::WaitConfig;
