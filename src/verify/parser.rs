//! Artifact re-parsers.
//!
//! Lightweight, text-level parsers for the two emitted unit kinds. They are
//! deliberately independent of the emitters - no shared descriptor state -
//! so a bug both emitters share in the same direction still surfaces when
//! the texts disagree, and the verifier can run against stale or
//! hand-edited output.

/// One parameter of an extern declaration: managed type spelling plus name.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternParam {
    pub ty: String,
    pub name: String,
}

/// A `static extern` declaration recovered from a managed unit.
#[derive(Debug, Clone, PartialEq)]
pub struct ManagedExtern {
    pub identifier: String,
    pub params: Vec<ExternParam>,
}

/// A boundary function recovered from a glue unit.
#[derive(Debug, Clone, PartialEq)]
pub struct GlueFunction {
    pub identifier: String,
    pub params: Vec<String>,
    pub body: String,
}

/// Pull every extern declaration out of a managed unit. Declarations are
/// one line each (`... static extern <ret> <name>(<params>);`).
pub fn parse_managed_externs(text: &str) -> Vec<ManagedExtern> {
    let mut externs = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        let Some(rest) = trimmed
            .find("static extern ")
            .map(|idx| &trimmed[idx + "static extern ".len()..])
        else {
            continue;
        };

        // Skip the return type token.
        let Some((_, sig)) = rest.split_once(' ') else {
            continue;
        };
        let Some(open) = sig.find('(') else { continue };
        let Some(close) = sig.rfind(')') else { continue };
        if close < open {
            continue;
        }

        let identifier = sig[..open].trim().to_string();
        if identifier.is_empty() {
            continue;
        }

        let params = split_params(&sig[open + 1..close])
            .into_iter()
            .filter_map(|p| {
                let mut words = p.split_whitespace();
                let ty = words.next()?.to_string();
                let name = words.next()?.to_string();
                Some(ExternParam { ty, name })
            })
            .collect();

        externs.push(ManagedExtern { identifier, params });
    }

    externs
}

/// Pull every library entry out of a glue unit. Entries look like
/// `<identifier>: function (<params>) {` with a balanced-brace body.
pub fn parse_glue_functions(text: &str) -> Vec<GlueFunction> {
    let mut functions = Vec::new();
    let mut lines = text.lines().peekable();

    while let Some(line) = lines.next() {
        let Some((identifier, params)) = match_glue_header(line) else {
            continue;
        };

        let mut depth = brace_delta(line);
        let mut body = String::new();
        while depth > 0 {
            let Some(body_line) = lines.next() else { break };
            depth += brace_delta(body_line);
            if depth <= 0 {
                break;
            }
            body.push_str(body_line);
            body.push('\n');
        }

        functions.push(GlueFunction {
            identifier,
            params,
            body,
        });
    }

    functions
}

fn match_glue_header(line: &str) -> Option<(String, Vec<String>)> {
    let trimmed = line.trim();
    let (name_part, rest) = trimmed.split_once(':')?;
    let identifier = name_part.trim();
    if identifier.is_empty() || !identifier.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return None;
    }

    let rest = rest.trim_start();
    let rest = rest.strip_prefix("function")?.trim_start();
    let rest = rest.strip_prefix('(')?;
    let close = rest.find(')')?;

    let params = split_params(&rest[..close])
        .into_iter()
        .map(|p| p.trim().to_string())
        .collect();

    Some((identifier.to_string(), params))
}

/// Net brace depth change of one line, ignoring braces inside quoted
/// strings and template literals. Hand-edited glue may use any of the
/// three quote kinds.
fn brace_delta(line: &str) -> i32 {
    let mut delta = 0;
    let mut quote: Option<char> = None;
    let mut prev = '\0';
    for ch in line.chars() {
        match quote {
            Some(q) => {
                if ch == q && prev != '\\' {
                    quote = None;
                }
            }
            None => match ch {
                '{' => delta += 1,
                '}' => delta -= 1,
                '\'' | '"' | '`' => quote = Some(ch),
                _ => {}
            },
        }
        prev = ch;
    }
    delta
}

fn split_params(text: &str) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    text.split(',').map(|p| p.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANAGED: &str = r#"
        [DllImport("__Internal")]
        private static extern void Analytics_Firebase_setUserId(string id);

        [DllImport("__Internal")]
        private static extern void Analytics_Firebase_logEvent(string name, double value, int callbackId);
    "#;

    #[test]
    fn recovers_externs_with_params() {
        let externs = parse_managed_externs(MANAGED);
        assert_eq!(externs.len(), 2);
        assert_eq!(externs[0].identifier, "Analytics_Firebase_setUserId");
        assert_eq!(externs[1].params.len(), 3);
        assert_eq!(externs[1].params[2].ty, "int");
        assert_eq!(externs[1].params[2].name, "callbackId");
    }

    #[test]
    fn recovers_glue_functions_and_bodies() {
        let glue = concat!(
            "mergeInto(LibraryManager.library, {\n",
            "  Analytics_Firebase_logEvent: function (name, value, callbackId) {\n",
            "    var fired = false;\n",
            "    var complete = function (result) {\n",
            "      if (fired) { return; }\n",
            "      SendMessage('BridgeDispatcher', 'Analytics_Firebase_OnBridgeComplete', callbackId + '|' + '');\n",
            "    };\n",
            "  },\n",
            "});\n",
        );

        let functions = parse_glue_functions(glue);
        assert_eq!(functions.len(), 1);
        let f = &functions[0];
        assert_eq!(f.identifier, "Analytics_Firebase_logEvent");
        assert_eq!(f.params, vec!["name", "value", "callbackId"]);
        assert_eq!(f.body.matches("SendMessage(").count(), 1);
    }

    #[test]
    fn braces_inside_strings_do_not_end_a_body() {
        let glue = concat!(
            "  Utils_log: function (message) {\n",
            "    var s = '} not a close {';\n",
            "    var messageVal = UTF8ToString(message);\n",
            "  },\n",
        );
        let functions = parse_glue_functions(glue);
        assert_eq!(functions.len(), 1);
        assert!(functions[0].body.contains("messageVal"));
    }

    #[test]
    fn braces_inside_template_literals_do_not_end_a_body() {
        let glue = concat!(
            "  Utils_log: function (message) {\n",
            "    var s = `tpl } brace {`;\n",
            "    var messageVal = UTF8ToString(message);\n",
            "  },\n",
        );
        let functions = parse_glue_functions(glue);
        assert_eq!(functions.len(), 1);
        assert!(functions[0].body.contains("messageVal"));
    }

    #[test]
    fn ignores_non_function_lines() {
        let functions = parse_glue_functions("mergeInto(LibraryManager.library, {\n});\n");
        assert!(functions.is_empty());
    }
}
