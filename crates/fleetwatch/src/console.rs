//! Interactive operator console.
//!
//! A line-oriented REPL over the shared [`Monitor`]. Every command routes
//! through the facade's public API, so the console sees exactly the state
//! ingestion workers are mutating in the background. The loop is fully
//! blocking (the facade is synchronous) and runs on a blocking task while
//! the telemetry server runs on the async runtime.

use std::io::{self, BufRead, Write};

use fleetwatch_core::model::{Category, EntityDraft, EntityId};
use fleetwatch_core::topology::ToggleOutcome;
use fleetwatch_core::{Comparison, Monitor};

use crate::output;

const HELP: &str = "\
Commands:
  list                       all entities
  view                       entities passing the active filter
  add <id> <name> <addr> [type]   register an entity (type: web|db|file)
  remove <id>                unregister an entity (asks for confirmation)
  search name <term>         entities whose name contains <term>
  search type <web|db|file>  entities of one category
  search id <n>              entity with exact id
  filter type <web|db|file>  restrict the view to one category
  filter id <lt|gt|eq> <n>   restrict the view by entity id
  filter reset               clear all filter terms
  history <id>               recent measurements for an entity
  ping <id>                  derived status of an entity
  place <id> <slot>          put an entity into a display slot (0-11)
  unplace <slot>             empty a display slot
  link <slot> <slot>         connect two occupied slots
  arrange                    fill slots with all entities in order
  clear slots|links          bulk-empty the display
  undo                       reverse the last operator action
  status                     monitor summary
  help                       this text
  quit                       exit";

pub struct Console {
    monitor: Monitor,
    assume_yes: bool,
}

enum Flow {
    Continue,
    Quit,
}

impl Console {
    pub fn new(monitor: Monitor, assume_yes: bool) -> Self {
        Self { monitor, assume_yes }
    }

    /// Run the REPL until `quit` or end of input.
    pub fn run(&self) -> io::Result<()> {
        let stdin = io::stdin();
        let mut lines = stdin.lock().lines();
        println!("fleetwatch console -- type 'help' for commands");
        loop {
            print!("> ");
            io::stdout().flush()?;
            let Some(line) = lines.next() else {
                break;
            };
            match self.dispatch(&line?, &mut io::stdin().lock()) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => break,
                Err(msg) => println!("error: {msg}"),
            }
        }
        Ok(())
    }

    /// Execute one command line. `confirm_input` is separate from the main
    /// line iterator so tests can script the Y/N answer.
    fn dispatch(&self, line: &str, confirm_input: &mut dyn BufRead) -> Result<Flow, String> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            [] => {}
            ["help"] => println!("{HELP}"),
            ["quit" | "exit"] => return Ok(Flow::Quit),

            ["list"] => println!("{}", output::entity_table(&self.monitor.entities())),
            ["view"] => println!("{}", output::entity_table(&self.monitor.filtered_entities())),

            ["add", id, name, addr] => self.add(id, name, addr, None)?,
            ["add", id, name, addr, category] => {
                self.add(id, name, addr, Some(parse_category(category)?))?;
            }
            ["remove", id] => self.remove(parse_id(id)?, confirm_input)?,

            ["search", "name", term] => {
                let term = term.to_lowercase();
                let hits: Vec<_> = self
                    .monitor
                    .entities()
                    .into_iter()
                    .filter(|e| e.name.to_lowercase().contains(&term))
                    .collect();
                println!("{}", output::entity_table(&hits));
            }
            ["search", "type", category] => {
                let category = parse_category(category)?;
                let hits: Vec<_> = self
                    .monitor
                    .entities()
                    .into_iter()
                    .filter(|e| e.category == category)
                    .collect();
                println!("{}", output::entity_table(&hits));
            }
            ["search", "id", id] => {
                let hits: Vec<_> = self.monitor.find(parse_id(id)?).into_iter().collect();
                println!("{}", output::entity_table(&hits));
            }

            ["filter", "type", category] => {
                self.monitor
                    .set_filter_category(Some(parse_category(category)?));
                println!("{}", output::entity_table(&self.monitor.filtered_entities()));
            }
            ["filter", "id", op, n] => {
                let comparison = match *op {
                    "lt" => Comparison::LessThan,
                    "gt" => Comparison::GreaterThan,
                    "eq" => Comparison::EqualTo,
                    other => return Err(format!("unknown comparison '{other}' (lt|gt|eq)")),
                };
                let threshold: u32 = n.parse().map_err(|_| format!("bad id '{n}'"))?;
                self.monitor.set_filter_threshold(threshold);
                self.monitor.select_comparison(comparison);
                println!("{}", output::entity_table(&self.monitor.filtered_entities()));
            }
            ["filter", "reset"] => {
                self.monitor.clear_filter();
                println!("filter cleared");
            }

            ["history", id] => {
                println!("{}", output::history_table(&self.monitor.history(parse_id(id)?)));
            }
            ["ping", id] => {
                let id = parse_id(id)?;
                match self.monitor.find(id) {
                    Some(e) => println!("{} is {}", e.name, output::status_label(e.status())),
                    None => println!("no entity with id {id}"),
                }
            }

            ["place", id, slot] => {
                let id = parse_id(id)?;
                let slot = parse_slot(slot)?;
                let source = self.monitor.slot_of(id);
                self.monitor
                    .place_in_slot(id, slot, source)
                    .map_err(|e| e.to_string())?;
                println!("placed {id} in slot {slot}");
            }
            ["unplace", slot] => {
                match self
                    .monitor
                    .remove_from_slot(parse_slot(slot)?)
                    .map_err(|e| e.to_string())?
                {
                    Some(id) => println!("removed {id} from slot {slot}"),
                    None => println!("slot {slot} was already empty"),
                }
            }
            ["link", a, b] => {
                let (a, b) = (parse_slot(a)?, parse_slot(b)?);
                match self.monitor.toggle_connection(a).map_err(|e| e.to_string())? {
                    ToggleOutcome::PendingSet(_) => {}
                    _ => return Err(format!("slot {a} is empty")),
                }
                match self.monitor.toggle_connection(b).map_err(|e| e.to_string())? {
                    ToggleOutcome::Connected(x, y) => println!("connected {x} and {y}"),
                    _ => {
                        self.monitor.clear_pending_connection();
                        println!("nothing to connect");
                    }
                }
            }
            ["arrange"] => {
                self.monitor.auto_arrange();
                println!("slots filled in registry order");
            }
            ["clear", "slots"] => {
                self.monitor.clear_slots();
                println!("all slots emptied");
            }
            ["clear", "links"] => {
                self.monitor.clear_connections();
                println!("all connections removed");
            }

            ["undo"] => {
                if self.monitor.undo() {
                    println!("undone");
                } else {
                    println!("nothing to undo");
                }
            }
            ["status"] => self.status(),

            _ => return Err(format!("unknown command '{line}' (try 'help')")),
        }
        Ok(Flow::Continue)
    }

    fn add(
        &self,
        id: &str,
        name: &str,
        addr: &str,
        category: Option<Category>,
    ) -> Result<(), String> {
        let draft = EntityDraft {
            id: id.parse().map_err(|_| format!("bad id '{id}'"))?,
            name: name.to_owned(),
            address: addr.to_owned(),
            category,
        };
        let entity = self.monitor.add_entity(draft).map_err(|e| e.to_string())?;
        println!("added {} ({})", entity.name, entity.id);
        Ok(())
    }

    fn remove(&self, id: EntityId, confirm_input: &mut dyn BufRead) -> Result<(), String> {
        let Some(entity) = self.monitor.find(id) else {
            return Err(format!("no entity with id {id}"));
        };
        if !self.assume_yes {
            print!("remove {} ({})? [y/N] ", entity.name, entity.id);
            let _ = io::stdout().flush();
            let mut answer = String::new();
            confirm_input
                .read_line(&mut answer)
                .map_err(|e| e.to_string())?;
            if !matches!(answer.trim(), "y" | "Y" | "yes") {
                println!("kept {}", entity.name);
                return Ok(());
            }
        }
        let removed = self.monitor.remove_entity(id).map_err(|e| e.to_string())?;
        println!("removed {} ({})", removed.name, removed.id);
        Ok(())
    }

    fn status(&self) {
        let slots = self.monitor.slots();
        let placed = slots.iter().filter(|s| s.is_some()).count();
        let connections = self.monitor.connections();
        let visible = connections.iter().filter(|c| c.visible).count();
        println!(
            "{} entities | {placed}/12 slots occupied | {visible}/{} connections visible | undo {}",
            self.monitor.entity_count(),
            connections.len(),
            if self.monitor.can_undo() { "available" } else { "empty" },
        );
    }
}

fn parse_id(raw: &str) -> Result<EntityId, String> {
    raw.parse::<u32>()
        .ok()
        .and_then(|n| EntityId::new(n).ok())
        .ok_or_else(|| format!("bad entity id '{raw}'"))
}

fn parse_slot(raw: &str) -> Result<usize, String> {
    raw.parse().map_err(|_| format!("bad slot index '{raw}'"))
}

fn parse_category(raw: &str) -> Result<Category, String> {
    raw.parse()
        .map_err(|_| format!("unknown type '{raw}' (web|db|file)"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fleetwatch_core::Monitor;

    fn console() -> Console {
        Console::new(Monitor::default(), false)
    }

    fn run(console: &Console, line: &str) -> Result<(), String> {
        run_with_answer(console, line, "")
    }

    fn run_with_answer(console: &Console, line: &str, answer: &str) -> Result<(), String> {
        let mut input = answer.as_bytes();
        console.dispatch(line, &mut input).map(|_| ())
    }

    #[test]
    fn add_then_list_roundtrip() {
        let console = console();
        run(&console, "add 4 edge-gw 10.0.0.4 web").unwrap();
        assert_eq!(console.monitor.entity_count(), 1);
        assert_eq!(
            console.monitor.find(EntityId::new(4).unwrap()).unwrap().category,
            Category::Web
        );
    }

    #[test]
    fn remove_requires_confirmation() {
        let console = console();
        run(&console, "add 4 edge-gw 10.0.0.4").unwrap();

        run_with_answer(&console, "remove 4", "n\n").unwrap();
        assert_eq!(console.monitor.entity_count(), 1);

        run_with_answer(&console, "remove 4", "y\n").unwrap();
        assert_eq!(console.monitor.entity_count(), 0);
    }

    #[test]
    fn filter_commands_drive_the_view() {
        let console = console();
        run(&console, "add 1 a 10.0.0.1 web").unwrap();
        run(&console, "add 2 b 10.0.0.2 db").unwrap();

        run(&console, "filter type db").unwrap();
        assert_eq!(console.monitor.filtered_entities().len(), 1);

        run(&console, "filter id lt 2").unwrap();
        assert!(console.monitor.filtered_entities().is_empty());

        run(&console, "filter reset").unwrap();
        assert_eq!(console.monitor.filtered_entities().len(), 2);
    }

    #[test]
    fn link_connects_two_placed_entities() {
        let console = console();
        run(&console, "add 1 a 10.0.0.1").unwrap();
        run(&console, "add 2 b 10.0.0.2").unwrap();
        run(&console, "place 1 0").unwrap();
        run(&console, "place 2 1").unwrap();
        run(&console, "link 0 1").unwrap();
        assert_eq!(console.monitor.connections().len(), 1);
    }

    #[test]
    fn unknown_command_reports_error() {
        let console = console();
        assert!(run(&console, "launch missiles").is_err());
    }
}
