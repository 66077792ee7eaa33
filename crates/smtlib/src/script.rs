use crate::command::Command;

/// The command sequence for one solver query.
///
/// Every query the verifier issues is single-shot: preamble, declarations,
/// one asserted negation, then `(check-sat)` and `(get-model)`. A `Script`
/// collects the leading commands and closes the query itself when rendered
/// via [`Script::to_query_text`], so callers never have to remember the
/// trailing commands.
#[derive(Debug, Clone, Default)]
pub struct Script {
    commands: Vec<Command>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, cmd: Command) {
        self.commands.push(cmd);
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Render as SMT-LIB2 text ready to pipe to a solver.
    ///
    /// Appends `(check-sat)` and `(get-model)` unless the script already
    /// contains them, so a bare assertion sequence becomes a complete
    /// satisfiability query.
    pub fn to_query_text(&self) -> String {
        let mut text = self.to_string();
        if !self.contains_check_sat() {
            text.push_str("(check-sat)\n");
        }
        if !self.contains_get_model() {
            text.push_str("(get-model)\n");
        }
        text
    }

    fn contains_check_sat(&self) -> bool {
        self.commands.iter().any(|c| matches!(c, Command::CheckSat))
    }

    fn contains_get_model(&self) -> bool {
        self.commands.iter().any(|c| matches!(c, Command::GetModel))
    }
}

impl Extend<Command> for Script {
    fn extend<I: IntoIterator<Item = Command>>(&mut self, iter: I) {
        self.commands.extend(iter);
    }
}

impl FromIterator<Command> for Script {
    fn from_iter<I: IntoIterator<Item = Command>>(iter: I) -> Self {
        Self {
            commands: iter.into_iter().collect(),
        }
    }
}
