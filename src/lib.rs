pub mod commands;
pub mod console;
pub mod port;
pub mod process;
pub mod server;
pub mod supervise;
pub mod watch;

/// ASCII art logo for the ember CLI
pub const LOGO: &str = "\
         )
   ┌─┐┌┬┐┌┐ ┌─┐┬─┐
   ├┤ │││├┴┐├┤ ├┬┘
   └─┘┴ ┴└─┘└─┘┴└─";

/// Default TCP port for the development server.
pub const DEFAULT_PORT: u16 = 8080;
