pub mod relay;

pub use relay::{ImageQueryRelay, RelayReport, ScriptOutput};
