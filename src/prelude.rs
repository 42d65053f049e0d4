pub use tracing::{debug, info, instrument};
