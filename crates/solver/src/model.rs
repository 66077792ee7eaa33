/// A model (satisfying assignment) from the solver.
///
/// Contains variable assignments extracted from `(get-model)` output. When a
/// verification condition fails, the model witnesses the violated obligation.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    /// Variable assignments: `(name, value_string)` pairs.
    pub assignments: Vec<(String, String)>,
}

impl Model {
    /// Create a new empty model.
    pub fn new() -> Self {
        Self {
            assignments: Vec::new(),
        }
    }

    /// Create a model from assignment pairs.
    pub fn with_assignments(assignments: Vec<(String, String)>) -> Self {
        Self { assignments }
    }

    /// Look up a variable's value by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.assignments
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Render the assignments as `x = 5, y = true`.
    pub fn summary(&self) -> String {
        self.assignments
            .iter()
            .map(|(k, v)| format!("{k} = {v}"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Return the number of assignments.
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// Return whether the model is empty.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}
