// Library surface shared by the binaries, the replay cli and integration tests.
pub mod arbitration;
pub mod cli;
pub mod clock;
pub mod config;
pub mod evidence;
pub mod logging;
pub mod router;
pub mod router_node;
pub mod server;
pub mod shutdown;
