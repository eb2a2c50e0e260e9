//! Line-oriented prompt over any reader/writer pair.
//!
//! The same session drives the local terminal and every TCP connection; all
//! of them share one [`Database`] behind a mutex, locked only while a command
//! touches it.

use anyhow::{anyhow, bail, Context, Result};
use record::{normalize_mass, User, BOOK_SEPARATOR};
use std::io::{BufRead, Write};
use std::sync::{Arc, Mutex};
use table::print_data;
use tracing::warn;

use crate::db::{lock, Database};
use crate::display::{BookStats, UserList, BOOK_STATS_HEADERS, USER_HEADERS};

const HELP: &str = "\
add         Add user to the database
help        Print this help
quit, exit  Exit the program
remove      Remove the user from the database
show        Print contents of the database
stats       Print the average reader age of each book";

/// What the session should do after a command.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct Session<R, W> {
    input: R,
    output: W,
    db: Arc<Mutex<Database>>,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(input: R, output: W, db: Arc<Mutex<Database>>) -> Self {
        Self { input, output, db }
    }

    /// Serves commands until `quit`/`exit` or the end of input.
    ///
    /// Failed commands are reported to the user and the session goes on.
    /// Only I/O errors on the session's own streams end it early.
    pub fn run(&mut self) -> Result<()> {
        writeln!(self.output, "Enter \"help\" for usage hints.")?;

        loop {
            let name = lock(&self.db)?.name();
            let Some(line) = self.ask(&format!("{name} > "))? else {
                break;
            };
            let Some(command) = line.split_whitespace().next() else {
                continue;
            };
            if self.dispatch(command)? == Flow::Quit {
                break;
            }
        }
        self.output.flush()?;
        Ok(())
    }

    fn dispatch(&mut self, command: &str) -> Result<Flow> {
        match command.to_ascii_lowercase().as_str() {
            "add" => self.add_user()?,
            "remove" => self.remove_user()?,
            "show" => self.show()?,
            "stats" => self.stats()?,
            "help" => writeln!(self.output, "{HELP}")?,
            "quit" | "exit" => return Ok(Flow::Quit),
            _ => writeln!(
                self.output,
                "Unknown operator {command:?}. Enter \"help\" for usage hints."
            )?,
        }
        Ok(Flow::Continue)
    }

    fn add_user(&mut self) -> Result<()> {
        if lock(&self.db)?.is_full() {
            writeln!(self.output, "Failed to add user: no free slots for a new user")?;
            return Ok(());
        }

        let user = match self.prompt_user() {
            Ok(Some(user)) => user,
            // input closed mid-prompt
            Ok(None) => return Ok(()),
            Err(err) => return self.report("Failed to add user", &err),
        };

        let added = lock(&self.db)?.add(user);
        match added {
            Ok(()) => writeln!(self.output, "User added")?,
            Err(err) => self.report("Failed to add user", &err)?,
        }
        Ok(())
    }

    fn prompt_user(&mut self) -> Result<Option<User>> {
        let Some(name) = self.ask("Enter name: ")? else {
            return Ok(None);
        };
        if name.is_empty() {
            bail!("no name is entered");
        }

        let Some(age) = self.ask("Enter age: ")? else {
            return Ok(None);
        };
        let age = parse_age(&age)?;

        let Some(active) = self.ask_active()? else {
            return Ok(None);
        };

        let Some(mass) = self.ask("Enter the user's mass: ")? else {
            return Ok(None);
        };
        let mass = parse_mass(&mass)?;

        let mut books = Vec::new();
        while let Some(book) = self.ask("Enter a name of book: ")? {
            if book.is_empty() {
                break;
            }
            if book.contains(BOOK_SEPARATOR) {
                writeln!(self.output, "Book titles cannot contain {:?}.", BOOK_SEPARATOR)?;
                continue;
            }
            books.push(book);
        }

        Ok(Some(User::new(name, age, active, mass, books)))
    }

    fn ask_active(&mut self) -> Result<Option<bool>> {
        let mut prompt = "Is the user active now? [yes/no]: ";
        loop {
            let Some(answer) = self.ask(prompt)? else {
                return Ok(None);
            };
            match parse_active(&answer) {
                Some(active) => return Ok(Some(active)),
                None => prompt = "Please, provide with [yes/no], [YyNn]: ",
            }
        }
    }

    fn remove_user(&mut self) -> Result<()> {
        let Some(name) = self.ask("Enter the name of user you want to remove: ")? else {
            return Ok(());
        };

        let removed = lock(&self.db)?.remove(&name);
        match removed {
            Ok(true) => writeln!(self.output, "User deleted")?,
            Ok(false) => writeln!(self.output, "user is not found")?,
            Err(err) => self.report("Failed to remove user", &err)?,
        }
        Ok(())
    }

    fn show(&mut self) -> Result<()> {
        let db = lock(&self.db)?;
        print_data(&mut self.output, &UserList(db.users()), &USER_HEADERS)?;
        writeln!(self.output, "Number of active users: {}", db.active_count())?;
        Ok(())
    }

    fn stats(&mut self) -> Result<()> {
        let stats: BookStats = lock(&self.db)?.book_stats();
        if stats.is_empty() {
            writeln!(self.output, "No books yet.")?;
            return Ok(());
        }
        writeln!(self.output, "Books Stats:")?;
        print_data(&mut self.output, &stats, &BOOK_STATS_HEADERS)?;
        Ok(())
    }

    /// Writes `prompt` and reads one trimmed line; `None` at end of input.
    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn report(&mut self, what: &str, err: &anyhow::Error) -> Result<()> {
        warn!(error = %format!("{err:#}"), "{what}");
        writeln!(self.output, "{what}: {err:#}")?;
        Ok(())
    }
}

/// Blank means zero.
fn parse_age(input: &str) -> Result<u8> {
    if input.is_empty() {
        return Ok(0);
    }
    input
        .parse()
        .with_context(|| format!("invalid age {input:?}"))
}

fn parse_active(input: &str) -> Option<bool> {
    match input.to_ascii_lowercase().as_str() {
        "yes" | "y" => Some(true),
        "no" | "n" | "" => Some(false),
        _ => None,
    }
}

/// Negative values clamp to zero before unit normalization.
fn parse_mass(input: &str) -> Result<f64> {
    let mass: f64 = input
        .parse()
        .with_context(|| format!("invalid mass {input:?}"))?;
    if mass.is_nan() {
        return Err(anyhow!("invalid mass {input:?}"));
    }
    Ok(normalize_mass(mass.max(0.0)))
}
