use crate::error::SolverError;
use crate::model::Model;
use crate::result::SolverResult;

/// Parse a solver's stdout into a `SolverResult`.
///
/// Expected output format:
/// - First line: `sat`, `unsat`, or `unknown`
/// - If `sat`: subsequent lines contain the model from `(get-model)`
pub fn parse_solver_output(stdout: &str, stderr: &str) -> Result<SolverResult, SolverError> {
    let stdout = stdout.trim();

    if stdout.is_empty() {
        if stderr.contains("timeout") {
            return Ok(SolverResult::Unknown("timeout".to_string()));
        }
        return Err(SolverError::ParseError(format!(
            "Empty solver output. stderr: {stderr}"
        )));
    }

    let first_line = stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("");

    match first_line {
        "unsat" => Ok(SolverResult::Unsat),
        "sat" => Ok(SolverResult::Sat(parse_model(stdout))),
        "unknown" => Ok(SolverResult::Unknown(extract_unknown_reason(
            stdout, stderr,
        ))),
        "timeout" => Ok(SolverResult::Unknown("timeout".to_string())),
        _ => Err(SolverError::ParseError(format!(
            "Unexpected solver output: {first_line}"
        ))),
    }
}

/// Extract the reason string for an "unknown" result.
///
/// Z3 sometimes prints the reason on the line after "unknown", often in
/// parentheses; CVC5 reports through stderr.
fn extract_unknown_reason(stdout: &str, stderr: &str) -> String {
    let after_unknown = stdout
        .lines()
        .skip_while(|line| line.trim() != "unknown")
        .skip(1)
        .map(str::trim)
        .find(|line| !line.is_empty());

    if let Some(reason) = after_unknown {
        reason
            .trim_start_matches('(')
            .trim_end_matches(')')
            .to_string()
    } else if !stderr.is_empty() {
        stderr.trim().to_string()
    } else {
        "unknown".to_string()
    }
}

/// Parse a model from `(get-model)` output.
///
/// Solvers print models in two known shapes:
///
/// ```text
/// (                                  (model
///   (define-fun x () Int               (define-fun x () Int 5)
///     5)                             )
/// )
/// ```
///
/// Only nullary `define-fun` entries (constants) are extracted; defined
/// predicates echoed back with parameters are skipped.
fn parse_model(output: &str) -> Option<Model> {
    if !output.contains("(define-fun ") {
        return None;
    }

    let mut assignments = Vec::new();
    let mut pos = 0;

    while let Some(def_pos) = output[pos..].find("(define-fun ") {
        let abs_pos = pos + def_pos;
        let after_define = abs_pos + "(define-fun ".len();

        match find_sexp_end(output, abs_pos) {
            Some(end) => {
                // end points AFTER the closing ')'; the body excludes both
                // the opening `(define-fun ` and the final `)`
                let body = &output[after_define..end - 1];
                if let Some((name, value)) = parse_define_fun(body) {
                    assignments.push((name, value));
                }
                pos = end;
            }
            None => pos = after_define,
        }
    }

    if assignments.is_empty() {
        None
    } else {
        Some(Model::with_assignments(assignments))
    }
}

/// Find the end of the S-expression starting at `start`.
/// Returns the index AFTER the closing paren.
fn find_sexp_end(input: &str, start: usize) -> Option<usize> {
    let bytes = input.as_bytes();
    if start >= bytes.len() || bytes[start] != b'(' {
        return None;
    }

    let mut depth = 1;
    let mut i = start + 1;
    while i < bytes.len() && depth > 0 {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => depth -= 1,
            _ => {}
        }
        i += 1;
    }

    if depth == 0 { Some(i) } else { None }
}

/// Parse a single `define-fun` body (everything after `(define-fun `, up to
/// but excluding the closing paren), possibly spanning multiple lines.
///
/// Returns `(name, value_string)` for nullary functions (constants).
fn parse_define_fun(input: &str) -> Option<(String, String)> {
    // Collapse all whitespace so multi-line entries parse uniformly
    let normalized: String = input.split_whitespace().collect::<Vec<_>>().join(" ");
    let input = normalized.trim();

    if input.is_empty() {
        return None;
    }

    let name_end = input.find(|c: char| c.is_whitespace())?;
    let name = input[..name_end].to_string();
    let rest = input[name_end..].trim_start();

    // Nullary functions only; entries with parameters are skipped
    if !rest.starts_with("()") {
        return None;
    }
    let rest = rest[2..].trim_start();

    // Skip the sort (`Int`, `Bool`, or compound like `(Array Int Int)`),
    // then take the remainder as the value.
    let mut pos = skip_sexp(rest, 0)?;
    let bytes = rest.as_bytes();
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }

    let value = rest[pos..].trim().to_string();
    if value.is_empty() {
        return None;
    }
    Some((name, value))
}

/// Skip one S-expression (atom or parenthesized) starting at `pos`.
/// Returns the position after it.
fn skip_sexp(input: &str, pos: usize) -> Option<usize> {
    let bytes = input.as_bytes();
    if pos >= bytes.len() {
        return None;
    }

    if bytes[pos] == b'(' {
        let mut depth = 1;
        let mut i = pos + 1;
        while i < bytes.len() && depth > 0 {
            match bytes[i] {
                b'(' => depth += 1,
                b')' => depth -= 1,
                _ => {}
            }
            i += 1;
        }
        Some(i)
    } else {
        let mut i = pos;
        while i < bytes.len()
            && !bytes[i].is_ascii_whitespace()
            && bytes[i] != b'('
            && bytes[i] != b')'
        {
            i += 1;
        }
        Some(i)
    }
}
