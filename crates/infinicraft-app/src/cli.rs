//! Line-oriented front end.
//!
//! Each input line is one command. Gestures are synthesized from the
//! command's coordinates (canvas-local pixels), then the driver settles and
//! a report of the workspace, feedback and discovery counter is produced.

use crate::driver::Driver;
use infinicraft_core::{DropOutcome, FeedbackOutcome, InstanceId, PointerSource, ProfileError, ProfileStore, Session};
use kurbo::{Point, Rect};
use std::fmt::Write as _;
use std::str::FromStr;
use std::time::Instant;
use thiserror::Error;

/// Help text for the `help` command.
pub const HELP: &str = "\
Commands:
  catalog                    list available elements
  ws                         list workspace instances
  add <name>                 add an element at a random spot
  drag <name|#n> <x> <y>     drag a catalog element or workspace instance #n
                             and release it at x, y (canvas pixels)
  clear                      clear the workspace
  reset                      reset discoveries to the base elements
  user <name>                switch user
  progress                   show the discovery counter
  quit                       exit";

/// What a `drag` command picks up.
#[derive(Debug, Clone, PartialEq)]
pub enum Subject {
    /// A catalog element, by name.
    Element(String),
    /// A workspace instance, by its 1-based position in the listing.
    Instance(usize),
}

/// A parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Catalog,
    Workspace,
    Add(String),
    Drag { subject: Subject, at: Point },
    Clear,
    Reset,
    User(String),
    Progress,
    Help,
    Quit,
}

/// Errors from parsing or running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,
    #[error("Unknown command: {0} (try `help`)")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
    #[error("Not a number: {0}")]
    BadNumber(String),
    #[error("No element named {0}")]
    UnknownElement(String),
    #[error("No workspace instance #{0}")]
    UnknownInstance(usize),
    #[error(transparent)]
    Profile(#[from] ProfileError),
}

fn coordinate(s: &str) -> Result<f64, CommandError> {
    s.parse().map_err(|_| CommandError::BadNumber(s.to_string()))
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (head, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        match head.to_ascii_lowercase().as_str() {
            "" => Err(CommandError::Empty),
            "catalog" => Ok(Command::Catalog),
            "ws" | "workspace" => Ok(Command::Workspace),
            "clear" => Ok(Command::Clear),
            "reset" => Ok(Command::Reset),
            "progress" => Ok(Command::Progress),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            "add" if !rest.is_empty() => Ok(Command::Add(rest.to_string())),
            "add" => Err(CommandError::Usage("add <name>")),
            "user" if !rest.is_empty() => Ok(Command::User(rest.to_string())),
            "user" => Err(CommandError::Usage("user <name>")),
            "drag" => {
                // Names may contain spaces; the last two words are the coordinates.
                let words: Vec<&str> = rest.split_whitespace().collect();
                let [name @ .., x, y] = words.as_slice() else {
                    return Err(CommandError::Usage("drag <name|#n> <x> <y>"));
                };
                if name.is_empty() {
                    return Err(CommandError::Usage("drag <name|#n> <x> <y>"));
                }
                let name = name.join(" ");
                let subject = match name.strip_prefix('#') {
                    Some(n) => Subject::Instance(n.parse().map_err(|_| CommandError::BadNumber(n.to_string()))?),
                    None => Subject::Element(name),
                };
                Ok(Command::Drag {
                    subject,
                    at: Point::new(coordinate(x)?, coordinate(y)?),
                })
            }
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

/// Whether the shell should keep reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Runs commands against a driver.
pub struct Shell {
    driver: Driver,
    profile: Box<dyn ProfileStore>,
}

impl Shell {
    pub fn new(driver: Driver, profile: Box<dyn ProfileStore>) -> Self {
        Self { driver, profile }
    }

    pub fn driver(&self) -> &Driver {
        &self.driver
    }

    /// Load the initial catalog and progress.
    pub async fn start(&mut self) {
        self.driver.session_mut().start();
        self.driver.settle().await;
    }

    /// Run one input line and return the text to print.
    pub async fn run_line(&mut self, line: &str) -> (Flow, String) {
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(CommandError::Empty) => return (Flow::Continue, String::new()),
            Err(e) => return (Flow::Continue, format!("{}\n", e)),
        };
        match self.execute(command).await {
            Ok(result) => result,
            Err(e) => (Flow::Continue, format!("{}\n", e)),
        }
    }

    /// Run a command, settle the driver and report.
    pub async fn execute(&mut self, command: Command) -> Result<(Flow, String), CommandError> {
        let mut out = String::new();
        match command {
            Command::Quit => return Ok((Flow::Quit, out)),
            Command::Help => {
                out.push_str(HELP);
                out.push('\n');
                return Ok((Flow::Continue, out));
            }
            Command::Catalog => {
                self.driver.poll();
                write_catalog(&mut out, self.driver.session());
                return Ok((Flow::Continue, out));
            }
            Command::Workspace | Command::Progress => {}
            Command::Add(name) => {
                let session = self.driver.session_mut();
                let id = session
                    .catalog()
                    .find_by_name(&name)
                    .map(|e| e.id.clone())
                    .ok_or_else(|| CommandError::UnknownElement(name.clone()))?;
                session.add_to_workspace(&id);
            }
            Command::Drag { subject, at } => {
                let outcome = drag(self.driver.session_mut(), subject, at)?;
                log::debug!("Drop outcome: {:?}", outcome);
            }
            Command::Clear => self.driver.session_mut().clear_workspace(),
            Command::Reset => self.driver.session_mut().reset_progress(),
            Command::User(name) => {
                let user = self.driver.session_mut().set_user(self.profile.as_ref(), &name)?;
                let _ = writeln!(out, "Playing as {}", user);
            }
        }

        self.driver.settle().await;
        self.driver.poll();
        write_report(&mut out, self.driver.session(), Instant::now());
        Ok((Flow::Continue, out))
    }
}

/// Press, move and release as a mouse would.
fn drag(session: &mut Session, subject: Subject, at: Point) -> Result<DropOutcome, CommandError> {
    let origin = session.canvas().origin().to_vec2();
    let size = session.config().element_size;
    let release = at + origin;

    match subject {
        Subject::Element(name) => {
            let id = session
                .catalog()
                .find_by_name(&name)
                .map(|e| e.id.clone())
                .ok_or(CommandError::UnknownElement(name))?;
            // Catalog entries sit outside the canvas; grab at the top-left corner.
            let bounds = Rect::from_origin_size(Point::ZERO, size);
            session.pointer_down_catalog(&id, bounds.origin(), bounds, PointerSource::Mouse);
        }
        Subject::Instance(n) => {
            let instance = n
                .checked_sub(1)
                .and_then(|i| session.workspace().list().get(i))
                .ok_or(CommandError::UnknownInstance(n))?;
            let id: InstanceId = instance.instance_id;
            let bounds = instance.bounds(size) + origin;
            session.pointer_down_instance(id, bounds.origin(), bounds, PointerSource::Mouse);
        }
    }
    session.pointer_move(release);
    Ok(session.pointer_up(release))
}

fn write_catalog(out: &mut String, session: &Session) {
    let elements = session.catalog().elements();
    if elements.is_empty() {
        out.push_str("Catalog is empty\n");
        return;
    }
    for element in elements {
        let _ = writeln!(out, "  {}", element.label());
    }
}

/// Workspace listing, visible feedback and discovery counter.
pub fn write_report(out: &mut String, session: &Session, now: Instant) {
    let workspace = session.workspace();
    if workspace.is_empty() {
        out.push_str("Workspace is empty\n");
    }
    for (i, instance) in workspace.list().iter().enumerate() {
        let _ = writeln!(
            out,
            "  #{} {} at ({:.0}, {:.0})",
            i + 1,
            instance.element.label(),
            instance.position.x,
            instance.position.y
        );
    }
    if let Some(feedback) = session.feedback(now) {
        match &feedback.outcome {
            FeedbackOutcome::Success(element) => {
                let _ = writeln!(out, "Created {}!", element.label());
            }
            FeedbackOutcome::Failure(message) => {
                let _ = writeln!(out, "{}", message);
            }
        }
    }
    let _ = writeln!(
        out,
        "Discoveries: {} ({})",
        session.catalog().discovery_count(),
        session.user()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use infinicraft_core::profile::MemoryProfileStore;
    use infinicraft_core::{ClientConfig, MemoryCraftService, UserId};
    use std::sync::Arc;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!("catalog".parse::<Command>().unwrap(), Command::Catalog);
        assert_eq!("  WS ".parse::<Command>().unwrap(), Command::Workspace);
        assert_eq!("add Water".parse::<Command>().unwrap(), Command::Add("Water".into()));
        assert_eq!("user  bob ".parse::<Command>().unwrap(), Command::User("bob".into()));
        assert!(matches!("".parse::<Command>(), Err(CommandError::Empty)));
        assert!(matches!("fly".parse::<Command>(), Err(CommandError::Unknown(_))));
        assert!(matches!("add".parse::<Command>(), Err(CommandError::Usage(_))));
    }

    #[test]
    fn test_parse_drag() {
        assert_eq!(
            "drag Hot Spring 10 20.5".parse::<Command>().unwrap(),
            Command::Drag {
                subject: Subject::Element("Hot Spring".into()),
                at: Point::new(10.0, 20.5),
            }
        );
        assert_eq!(
            "drag #2 300 200".parse::<Command>().unwrap(),
            Command::Drag {
                subject: Subject::Instance(2),
                at: Point::new(300.0, 200.0),
            }
        );
        assert!(matches!("drag 10 20".parse::<Command>(), Err(CommandError::Usage(_))));
        assert!(matches!("drag Water x 20".parse::<Command>(), Err(CommandError::BadNumber(_))));
        assert!(matches!("drag #a 1 2".parse::<Command>(), Err(CommandError::BadNumber(_))));
    }

    async fn shell() -> Shell {
        let session = Session::new(UserId::from("alice"), ClientConfig::default());
        let driver = Driver::new(session, Arc::new(MemoryCraftService::new()));
        let mut shell = Shell::new(driver, Box::new(MemoryProfileStore::with_username("alice")));
        shell.start().await;
        shell
    }

    #[tokio::test]
    async fn test_water_and_fire_session() {
        let mut shell = shell().await;

        let (_, out) = shell.run_line("drag Fire 300 200").await;
        assert!(out.contains("#1 🔥 Fire at (300, 200)"));

        let (_, out) = shell.run_line("drag Water 310 210").await;
        assert!(out.contains("#1 ♨️ Steam at (300, 200)"), "{}", out);
        assert!(out.contains("Created ♨️ Steam!"));
        assert!(out.contains("Discoveries: 5 (alice)"));

        let (_, out) = shell.run_line("catalog").await;
        assert!(out.contains("♨️ Steam"));
    }

    #[tokio::test]
    async fn test_failed_combination_reports_message() {
        let mut shell = shell().await;
        shell.run_line("drag Water 300 200").await;

        let (_, out) = shell.run_line("drag Water 310 210").await;
        assert!(out.contains("These elements cannot be combined"));
        assert!(out.contains("at (240, 200)"));
        assert!(out.contains("Discoveries: 4"));
    }

    #[tokio::test]
    async fn test_move_instance_and_clear() {
        let mut shell = shell().await;
        shell.run_line("add wind").await;
        let (_, out) = shell.run_line("drag #1 50 60").await;
        assert!(out.contains("#1 💨 Wind at (50, 60)"));

        let (_, out) = shell.run_line("drag #7 1 1").await;
        assert!(out.contains("No workspace instance #7"));

        let (_, out) = shell.run_line("clear").await;
        assert!(out.contains("Workspace is empty"));
    }

    #[tokio::test]
    async fn test_switch_user_and_reset() {
        let mut shell = shell().await;
        shell.run_line("drag Fire 300 200").await;
        shell.run_line("drag Water 310 210").await;

        let (_, out) = shell.run_line("user carol").await;
        assert!(out.contains("Playing as carol"));
        assert!(out.contains("Discoveries: 4 (carol)"));

        let (_, out) = shell.run_line("user alice").await;
        assert!(out.contains("Discoveries: 5 (alice)"));

        let (_, out) = shell.run_line("reset").await;
        assert!(out.contains("Workspace is empty"));
        assert!(out.contains("Discoveries: 4 (alice)"));

        let (_, out) = shell.run_line("user   ").await;
        assert!(out.contains("Usage"));
    }

    #[tokio::test]
    async fn test_quit() {
        let mut shell = shell().await;
        assert_eq!(shell.run_line("quit").await.0, Flow::Quit);
        assert_eq!(shell.run_line("nonsense").await.0, Flow::Continue);
    }
}
