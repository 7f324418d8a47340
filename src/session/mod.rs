//! Interactive session
//!
//! A menu-driven state machine:
//!
//! ```text
//! MainMenu ──query──▶ QueryMenu ──pick──▶ QueryLoop ──"exit"──▶ MainMenu
//!    │  └──add──▶ AddMenu ──build / error──▶ MainMenu
//!    └──quit──▶ Exit
//! ```
//!
//! Every state has its own step function returning the next state. Ctrl-C
//! anywhere surfaces as `DocuchatError::Interrupted` and ends the run.

pub mod backend;
pub mod prompter;
pub mod spinner;

pub use backend::{Assistant, Backend};
pub use prompter::{Prompter, TerminalPrompter};
pub use spinner::Spinner;

use std::io::Write;
use std::path::Path;

use colored::Colorize;

use crate::core::document::SourceDocument;
use crate::core::error::Result;
use crate::core::interrupt::CancelToken;
use crate::core::paths::AppPaths;

pub const MENU_QUERY: &str = "Query a document";
pub const MENU_ADD: &str = "Add a new document";
pub const MENU_QUIT: &str = "Quit";
pub const ENTER_PATH: &str = "Enter the path to a PDF";
pub const EXIT_COMMAND: &str = "exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    MainMenu,
    QueryMenu,
    QueryLoop { document: String },
    AddMenu,
    Exit,
}

pub struct Session<P, B, W> {
    paths: AppPaths,
    prompter: P,
    backend: B,
    out: W,
    cancel: CancelToken,
}

impl<P: Prompter, B: Backend, W: Write> Session<P, B, W> {
    pub fn new(paths: AppPaths, prompter: P, backend: B, out: W, cancel: CancelToken) -> Self {
        Self {
            paths,
            prompter,
            backend,
            out,
            cancel,
        }
    }

    /// Run from `MainMenu` until `Exit`.
    pub fn run(&mut self) -> Result<()> {
        self.paths.ensure_dirs()?;

        let mut state = State::MainMenu;
        while state != State::Exit {
            self.cancel.check()?;
            tracing::trace!(?state, "step");
            state = self.step(state)?;
        }
        Ok(())
    }

    pub fn step(&mut self, state: State) -> Result<State> {
        match state {
            State::MainMenu => self.main_menu(),
            State::QueryMenu => self.query_menu(),
            State::QueryLoop { document } => self.query_loop(document),
            State::AddMenu => self.add_menu(),
            State::Exit => Ok(State::Exit),
        }
    }

    fn main_menu(&mut self) -> Result<State> {
        let choices = [MENU_QUERY, MENU_ADD, MENU_QUIT].map(String::from);
        let choice = self.prompter.select("What would you like to do?", &choices)?;

        match choices.get(choice).map(String::as_str) {
            Some(MENU_QUERY) => {
                if self.paths.list_indexes()?.is_empty() {
                    writeln!(self.out, "{}", "No PDFs were found".red())?;
                    Ok(State::MainMenu)
                } else {
                    Ok(State::QueryMenu)
                }
            }
            Some(MENU_ADD) => Ok(State::AddMenu),
            _ => Ok(State::Exit),
        }
    }

    fn query_menu(&mut self) -> Result<State> {
        let documents = self.paths.list_indexes()?;
        if documents.is_empty() {
            writeln!(self.out, "{}", "No PDFs were found".red())?;
            return Ok(State::MainMenu);
        }

        let choice = self.prompter.select("Select a document to query", &documents)?;
        match documents.into_iter().nth(choice) {
            Some(document) => Ok(State::QueryLoop { document }),
            None => Ok(State::MainMenu),
        }
    }

    /// One iteration: read a line, maybe answer it, stay in the loop.
    fn query_loop(&mut self, document: String) -> Result<State> {
        let query = self.prompter.read_query()?;

        if query == EXIT_COMMAND {
            return Ok(State::MainMenu);
        }
        if query.trim().is_empty() {
            return Ok(State::QueryLoop { document });
        }

        let response = {
            let _spinner = Spinner::start("Thinking...");
            let _blocking = self.cancel.blocking();
            self.backend.query(&query, &document)?
        };

        response.print_response_stream(&mut self.out, &self.cancel)?;
        writeln!(self.out, "\x1b[0m\n")?;
        self.out.flush()?;

        Ok(State::QueryLoop { document })
    }

    fn add_menu(&mut self) -> Result<State> {
        let managed = self.paths.list_managed_pdfs();
        let mut choices = vec![ENTER_PATH.to_string()];
        choices.extend(managed.iter().map(|p| p.display().to_string()));

        let choice = self.prompter.select("Select a document to add", &choices)?;

        let source = if choice == 0 {
            let raw = self.prompter.input_path(ENTER_PATH)?;
            let path = Path::new(&raw);
            if !path.is_file() {
                writeln!(self.out, "{}", "Unable to find the document.".red())?;
                return Ok(State::MainMenu);
            }
            SourceDocument::absolute(path)?
        } else {
            match managed.get(choice - 1) {
                Some(file) => SourceDocument::managed(&self.paths, file)?,
                None => return Ok(State::MainMenu),
            }
        };

        let summary = {
            let _spinner = Spinner::start(format!("Indexing {}...", source.name));
            self.backend.build_index(&source, &self.cancel)?
        };
        tracing::debug!(document = %summary.name, chunks = summary.chunk_count, "document added");

        writeln!(self.out, "{}", "Saved PDF index to disk".green())?;
        writeln!(self.out, "Added your PDF")?;
        Ok(State::MainMenu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::DocuchatError;
    use crate::index::IndexSummary;
    use crate::query::StreamingResponse;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::fs;
    use tempfile::TempDir;

    enum Reply {
        Select(usize),
        Text(String),
    }

    fn text(s: impl Into<String>) -> Reply {
        Reply::Text(s.into())
    }

    /// Plays back canned answers; runs out → Interrupted.
    struct ScriptedPrompter {
        replies: VecDeque<Reply>,
        menus: Vec<(String, Vec<String>)>,
    }

    impl ScriptedPrompter {
        fn new(replies: Vec<Reply>) -> Self {
            Self {
                replies: replies.into(),
                menus: Vec::new(),
            }
        }

        fn next_text(&mut self) -> Result<String> {
            match self.replies.pop_front() {
                Some(Reply::Text(t)) => Ok(t),
                Some(Reply::Select(_)) => panic!("expected text reply"),
                None => Err(DocuchatError::Interrupted),
            }
        }
    }

    impl Prompter for ScriptedPrompter {
        fn select(&mut self, message: &str, choices: &[String]) -> Result<usize> {
            self.menus.push((message.to_string(), choices.to_vec()));
            match self.replies.pop_front() {
                Some(Reply::Select(i)) => Ok(i),
                Some(Reply::Text(_)) => panic!("expected select reply"),
                None => Err(DocuchatError::Interrupted),
            }
        }

        fn input_path(&mut self, _message: &str) -> Result<String> {
            self.next_text()
        }

        fn read_query(&mut self) -> Result<String> {
            self.next_text()
        }
    }

    /// Records calls; "indexing" creates the directory, answers are canned.
    #[derive(Default)]
    struct FakeBackend {
        indexes_root: std::path::PathBuf,
        built: RefCell<Vec<SourceDocument>>,
        queries: RefCell<Vec<(String, String)>>,
        cancel: CancelToken,
        query_in_blocking_call: RefCell<Vec<bool>>,
    }

    impl Backend for FakeBackend {
        fn build_index(&self, source: &SourceDocument, _cancel: &CancelToken) -> Result<IndexSummary> {
            let index_dir = self.indexes_root.join(&source.name);
            fs::create_dir_all(&index_dir)?;
            fs::write(index_dir.join("vector_store.db"), b"fake")?;
            self.built.borrow_mut().push(source.clone());
            Ok(IndexSummary {
                name: source.name.clone(),
                index_dir,
                chunk_count: 1,
                duration_ms: 0,
            })
        }

        fn query(&self, question: &str, document: &str) -> Result<StreamingResponse> {
            self.queries
                .borrow_mut()
                .push((question.to_string(), document.to_string()));
            self.query_in_blocking_call
                .borrow_mut()
                .push(self.cancel.in_blocking_call());
            let tokens: Vec<Result<String>> = vec![Ok("It ".into()), Ok("grew.".into())];
            Ok(StreamingResponse::new(Vec::new(), Box::new(tokens.into_iter())))
        }
    }

    fn session(
        tmp: &TempDir,
        replies: Vec<Reply>,
    ) -> Session<ScriptedPrompter, FakeBackend, Vec<u8>> {
        let paths = AppPaths::from_root(tmp.path());
        let cancel = CancelToken::new();
        let backend = FakeBackend {
            indexes_root: paths.indexes.clone(),
            cancel: cancel.clone(),
            ..Default::default()
        };
        Session::new(paths, ScriptedPrompter::new(replies), backend, Vec::new(), cancel)
    }

    fn output(session: &Session<ScriptedPrompter, FakeBackend, Vec<u8>>) -> String {
        String::from_utf8_lossy(&session.out).to_string()
    }

    #[test]
    fn test_quit_creates_layout() -> Result<()> {
        let tmp = TempDir::new()?;
        let mut session = session(&tmp, vec![Reply::Select(2)]);

        session.run()?;
        assert!(tmp.path().join("pdfs").is_dir());
        assert!(tmp.path().join("gpt_indexes").is_dir());
        assert_eq!(
            session.prompter.menus[0].1,
            vec![MENU_QUERY, MENU_ADD, MENU_QUIT]
        );
        Ok(())
    }

    #[test]
    fn test_query_without_indexes_stays_in_main_menu() -> Result<()> {
        let tmp = TempDir::new()?;
        let mut session = session(&tmp, vec![Reply::Select(0), Reply::Select(2)]);

        session.run()?;
        assert!(output(&session).contains("No PDFs were found"));
        assert_eq!(session.prompter.menus.len(), 2);
        assert!(session.backend.queries.borrow().is_empty());
        Ok(())
    }

    #[test]
    fn test_add_managed_then_query() -> Result<()> {
        let tmp = TempDir::new()?;
        let pdfs = tmp.path().join("pdfs");
        fs::create_dir_all(&pdfs)?;
        fs::write(pdfs.join("report.pdf"), b"%PDF-1.4")?;

        let mut session = session(
            &tmp,
            vec![
                Reply::Select(1), // add
                Reply::Select(1), // pdfs/report.pdf
                Reply::Select(0), // query
                Reply::Select(0), // report.pdf
                text("What is the summary?"),
                text("exit"),
                Reply::Select(2), // quit
            ],
        );
        session.run()?;

        let built = session.backend.built.borrow();
        assert_eq!(built.len(), 1);
        assert_eq!(built[0].name, "report.pdf");
        assert_eq!(built[0].path, pdfs.join("report.pdf"));
        assert!(tmp.path().join("gpt_indexes/report.pdf").is_dir());

        let add_menu = &session.prompter.menus[1].1;
        assert_eq!(add_menu[0], ENTER_PATH);
        assert!(add_menu[1].ends_with("report.pdf"));

        assert_eq!(
            *session.backend.queries.borrow(),
            vec![("What is the summary?".to_string(), "report.pdf".to_string())]
        );
        assert_eq!(*session.backend.query_in_blocking_call.borrow(), vec![true]);
        assert!(!session.cancel.in_blocking_call());

        let out = output(&session);
        assert!(out.contains("Saved PDF index to disk"));
        assert!(out.contains("Added your PDF"));
        assert!(out.contains("It "));
        assert!(out.contains("grew."));
        Ok(())
    }

    #[test]
    fn test_exit_and_blank_lines_issue_no_query() -> Result<()> {
        let tmp = TempDir::new()?;
        fs::create_dir_all(tmp.path().join("gpt_indexes/report.pdf"))?;

        let mut session = session(
            &tmp,
            vec![
                Reply::Select(0),
                Reply::Select(0),
                text(""),
                text("   \t"),
                text("EXIT"),
                text("exit"),
                Reply::Select(2),
            ],
        );
        session.run()?;

        // "EXIT" is not the exit command; it is a question.
        assert_eq!(
            *session.backend.queries.borrow(),
            vec![("EXIT".to_string(), "report.pdf".to_string())]
        );
        Ok(())
    }

    #[test]
    fn test_query_loop_step_transitions() -> Result<()> {
        let tmp = TempDir::new()?;
        let mut session = session(&tmp, vec![text("  "), text("exit")]);
        let state = State::QueryLoop {
            document: "report.pdf".into(),
        };

        assert_eq!(session.step(state.clone())?, state);
        assert_eq!(session.step(state)?, State::MainMenu);
        assert!(session.backend.queries.borrow().is_empty());
        Ok(())
    }

    #[test]
    fn test_custom_path_missing_file() -> Result<()> {
        let tmp = TempDir::new()?;
        let mut session = session(
            &tmp,
            vec![
                Reply::Select(1),
                Reply::Select(0),
                text("/definitely/not/here.pdf"),
                Reply::Select(2),
            ],
        );
        session.run()?;

        assert!(output(&session).contains("Unable to find the document."));
        assert!(session.backend.built.borrow().is_empty());
        assert!(fs::read_dir(tmp.path().join("gpt_indexes"))?.next().is_none());
        Ok(())
    }

    #[test]
    fn test_custom_path_builds_absolute() -> Result<()> {
        let tmp = TempDir::new()?;
        let file = tmp.path().join("paper.pdf");
        fs::write(&file, b"%PDF-1.4")?;

        let mut session = session(
            &tmp,
            vec![
                Reply::Select(1),
                Reply::Select(0),
                text(file.display().to_string()),
                Reply::Select(2),
            ],
        );
        session.run()?;

        let built = session.backend.built.borrow();
        assert_eq!(built.len(), 1);
        assert_eq!(built[0].path, file);
        assert_eq!(built[0].mode, crate::core::document::AddMode::Absolute);
        Ok(())
    }

    #[test]
    fn test_interrupt_propagates() {
        let tmp = TempDir::new().unwrap();
        let mut session = session(&tmp, vec![]);

        let err = session.run().unwrap_err();
        assert!(err.is_interrupt());
    }

    #[test]
    fn test_cancelled_token_stops_run() {
        let tmp = TempDir::new().unwrap();
        let mut session = session(&tmp, vec![Reply::Select(2)]);
        session.cancel.cancel();

        assert!(matches!(session.run(), Err(DocuchatError::Interrupted)));
        assert!(session.prompter.menus.is_empty());
    }
}
