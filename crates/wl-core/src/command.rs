//! Command vocabulary and dispatch
//!
//! A [`Dispatcher`] routes one line of input to a handler bound to the
//! command named by its first word. Routes are plain function pointers
//! registered once from fixed tables; a recognized command without a route
//! is a wiring defect and is reported separately from an unknown word.

use crate::error::{LedgerError, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Recognized command names
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Command {
    Save,
    Load,
    Start,
    Stop,
    Ttime,
    Calc,
    AddSession,
    PrintSessions,
    ClearSessions,
    ChangeHourlyPrice,
    MarkPaid,
    MarkUnpaid,
    Ims,
    Clear,
}

impl Command {
    /// The closed vocabulary
    pub const ALL: [Command; 14] = [
        Command::Save,
        Command::Load,
        Command::Start,
        Command::Stop,
        Command::Ttime,
        Command::Calc,
        Command::AddSession,
        Command::PrintSessions,
        Command::ClearSessions,
        Command::ChangeHourlyPrice,
        Command::MarkPaid,
        Command::MarkUnpaid,
        Command::Ims,
        Command::Clear,
    ];

    /// Token typed by the user
    pub fn name(&self) -> &'static str {
        match self {
            Command::Save => "save",
            Command::Load => "load",
            Command::Start => "start",
            Command::Stop => "stop",
            Command::Ttime => "ttime",
            Command::Calc => "calc",
            Command::AddSession => "add_session",
            Command::PrintSessions => "print_sessions",
            Command::ClearSessions => "clear_sessions",
            Command::ChangeHourlyPrice => "change_h_price",
            Command::MarkPaid => "mark_paid",
            Command::MarkUnpaid => "mark_unpaid",
            Command::Ims => "ims",
            Command::Clear => "clear",
        }
    }

    /// Look up a command by token, ignoring case and surrounding space
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Command {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or_else(|| LedgerError::UnknownCommand(s.trim().to_string()))
    }
}

/// Operation bound to a command: receives the target and the arguments
/// following the command word, returns text to print
pub type Handler<T> = fn(&mut T, &[&str]) -> Result<String>;

/// A handler object's bindings
pub type RouteTable<T> = &'static [(Command, Handler<T>)];

/// Routes commands to handlers on a target of type `T`
pub struct Dispatcher<T> {
    routes: BTreeMap<Command, Handler<T>>,
}

impl<T> Dispatcher<T> {
    /// Start building a dispatcher
    pub fn builder() -> DispatcherBuilder<T> {
        DispatcherBuilder {
            routes: BTreeMap::new(),
        }
    }

    /// Dispatch one input line.
    ///
    /// Returns `Ok(None)` for a blank line, the handler's reply otherwise.
    pub fn dispatch(&self, target: &mut T, line: &str) -> Result<Option<String>> {
        let mut parts = line.split_whitespace();
        let Some(word) = parts.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = parts.collect();

        let command: Command = word.parse().map_err(|e| {
            info!("The command '{}' doesn't exist", word);
            e
        })?;

        let Some(handler) = self.routes.get(&command) else {
            warn!("Command '{}' registered but has no handler", command);
            return Err(LedgerError::UnimplementedCommand(command.to_string()));
        };

        debug!("Dispatching '{}' with {} argument(s)", command, args.len());
        handler(target, &args).map(Some)
    }

    /// Recognized commands with no handler bound
    pub fn unbound(&self) -> Vec<Command> {
        Command::ALL
            .into_iter()
            .filter(|c| !self.routes.contains_key(c))
            .collect()
    }
}

/// Builder collecting route tables from one or more handler objects.
///
/// Tables are consulted in registration order; the first binding for a
/// command wins.
pub struct DispatcherBuilder<T> {
    routes: BTreeMap<Command, Handler<T>>,
}

impl<T> DispatcherBuilder<T> {
    /// Bind a single command
    pub fn route(mut self, command: Command, handler: Handler<T>) -> Self {
        if self.routes.contains_key(&command) {
            warn!("Command '{}' already bound, keeping first handler", command);
        } else {
            self.routes.insert(command, handler);
        }
        self
    }

    /// Bind every entry of a handler object's table
    pub fn table(self, table: RouteTable<T>) -> Self {
        table
            .iter()
            .fold(self, |builder, (command, handler)| builder.route(*command, *handler))
    }

    /// Finish, logging any recognized command left without a handler
    pub fn build(self) -> Dispatcher<T> {
        let dispatcher = Dispatcher {
            routes: self.routes,
        };
        for command in dispatcher.unbound() {
            debug!("Command '{}' has no handler", command);
        }
        dispatcher
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Counter {
        value: i64,
        log: Vec<String>,
    }

    impl Counter {
        const ROUTES: RouteTable<Counter> = &[
            (Command::Start, Counter::cmd_start),
            (Command::Calc, Counter::cmd_calc),
        ];

        fn cmd_start(&mut self, _args: &[&str]) -> Result<String> {
            self.value += 1;
            Ok(format!("value {}", self.value))
        }

        fn cmd_calc(&mut self, args: &[&str]) -> Result<String> {
            self.log.push(args.join(","));
            Ok(args.len().to_string())
        }

        fn cmd_other_start(&mut self, _args: &[&str]) -> Result<String> {
            self.value += 100;
            Ok("other".to_string())
        }
    }

    fn dispatcher() -> Dispatcher<Counter> {
        Dispatcher::builder().table(Counter::ROUTES).build()
    }

    #[test]
    fn test_command_names() {
        for command in Command::ALL {
            assert_eq!(Command::from_name(command.name()), Some(command));
        }
        assert_eq!(Command::from_name(" CALC "), Some(Command::Calc));
        assert_eq!(Command::from_name("change_h_price"), Some(Command::ChangeHourlyPrice));
        assert_eq!(Command::from_name("exit"), None);
        assert!(matches!(
            "nope".parse::<Command>(),
            Err(LedgerError::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_dispatch_routes_with_args() {
        let dispatcher = dispatcher();
        let mut target = Counter::default();

        let reply = dispatcher
            .dispatch(&mut target, "calc 01/01/2024   02/01/2024")
            .unwrap();
        assert_eq!(reply, Some("2".to_string()));
        assert_eq!(target.log, vec!["01/01/2024,02/01/2024".to_string()]);

        let reply = dispatcher.dispatch(&mut target, "start").unwrap();
        assert_eq!(reply, Some("value 1".to_string()));
    }

    #[test]
    fn test_blank_line() {
        let mut target = Counter::default();
        assert_eq!(dispatcher().dispatch(&mut target, "   ").unwrap(), None);
    }

    #[test]
    fn test_unknown_vs_unimplemented() {
        let dispatcher = dispatcher();
        let mut target = Counter::default();

        assert!(matches!(
            dispatcher.dispatch(&mut target, "frobnicate now"),
            Err(LedgerError::UnknownCommand(word)) if word == "frobnicate"
        ));
        assert!(matches!(
            dispatcher.dispatch(&mut target, "save"),
            Err(LedgerError::UnimplementedCommand(name)) if name == "save"
        ));
        assert_eq!(target.value, 0);
    }

    #[test]
    fn test_first_binding_wins() {
        let dispatcher = Dispatcher::builder()
            .table(Counter::ROUTES)
            .route(Command::Start, Counter::cmd_other_start)
            .build();
        let mut target = Counter::default();
        dispatcher.dispatch(&mut target, "start").unwrap();
        assert_eq!(target.value, 1);
    }

    #[test]
    fn test_unbound_commands() {
        let dispatcher = dispatcher();
        let unbound = dispatcher.unbound();
        assert!(!unbound.contains(&Command::Start));
        assert!(unbound.contains(&Command::Save));
        assert_eq!(unbound.len(), Command::ALL.len() - 2);
        assert!(!unbound.contains(&Command::Calc));
    }
}
