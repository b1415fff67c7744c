//! HTTP gateway
//!
//! | Method | Path      | Auth | Action                     |
//! |--------|-----------|------|----------------------------|
//! | GET    | `/`       | no   | Track list page            |
//! | GET    | `/health` | no   | Health summary             |
//! | POST   | `/`       | yes  | Play `{file}`              |
//! | POST   | `/stop`   | yes  | Stop playback              |
//! | POST   | `/volume` | yes  | Set mixer to `{volume}`    |

pub mod auth_middleware;
pub mod error;
pub mod handlers;
pub mod payload;
pub mod server;
pub mod ui;

pub use error::ApiError;
pub use server::{build_router, AppContext};
