use std::collections::BTreeMap;

/// Lexical analysis of operator definitions and catalog records:
/// - Splitting a pipeline into steps
/// - Splitting a step into parameters (i.e. key=value-pairs)
/// - Syntactical normalization by eliminating non-significant whitespace
/// - Checking whether a given operator is singular or a pipeline
/// - Checking whether a name is a macro name ("resource name"), and
/// - Accessing the name of a given operator.
pub trait Tokenize {
    /// Split a pipeline definition into steps and a potentially empty docstring.
    /// Lines starting with `##` are docstring lines, while everything
    /// following a single `#` is a comment
    fn split_into_steps(&self) -> (Vec<String>, String);

    /// Split a step into parameters. Give special treatment to names and flags:
    /// ```txt
    /// 'foo bar=baz bonk=blue flag' -> ('name=foo', 'bar=baz', 'bonk=blue', 'flag=true')
    /// ```
    fn split_into_parameters(&self) -> BTreeMap<String, String>;

    /// Glue syntactical elements together, and separate them from each other
    /// by a single space:
    ///
    /// 1. Key-value pairs: `key1= value1   key2    =value2  ->  key1=value1 key2=value2`
    /// 2. The macro sigil: `EPSG: 4258 -> EPSG:4258`
    /// 3. Sequence separators: `foo | bar baz=bonk ,  bonk  ->  foo|bar baz=bonk,bonk`
    fn normalize(&self) -> String;

    /// Strip `#`-comments, line by line
    fn remove_comments(&self) -> String;

    fn is_pipeline(&self) -> bool;
    fn is_resource_name(&self) -> bool;
    fn operator_name(&self, default: &str) -> String;
}

/// Tokenize implementation for string-like objects
impl<T> Tokenize for T
where
    T: AsRef<str>,
{
    fn split_into_steps(&self) -> (Vec<String>, String) {
        let all = self
            .as_ref()
            .replace("\r\n", "\n")
            .replace('\r', "\n")
            .trim()
            .to_string();

        let mut docstring = Vec::<String>::new();
        for line in all.lines() {
            let line = line.trim();
            if let Some(doc) = line.strip_prefix("##") {
                docstring.push(doc.trim().to_string());
            }
        }
        let docstring = docstring.join("\n").trim().to_string();

        let steps: Vec<String> = all
            .remove_comments()
            .normalize()
            .split('|')
            .filter(|x| !x.is_empty())
            .map(|x| x.to_string())
            .collect();

        (steps, docstring)
    }

    fn split_into_parameters(&self) -> BTreeMap<String, String> {
        let step = self.normalize();
        let mut params = BTreeMap::new();
        for element in step.split_whitespace() {
            // Flags are booleans that are true when specified, false when not
            let (key, value) = match element.split_once('=') {
                Some((key, value)) => (key, Some(value)),
                None => (element, None),
            };

            // The first key-without-value is the name of the operator
            if params.is_empty() && value.is_none() {
                params.insert(String::from("name"), String::from(key));
                continue;
            }

            params.insert(String::from(key), String::from(value.unwrap_or("true")));
        }

        params
    }

    fn normalize(&self) -> String {
        let elements: Vec<_> = self.as_ref().split_whitespace().collect();
        elements
            .join(" ")
            .replace("= ", "=")
            .replace(": ", ":")
            .replace(", ", ",")
            .replace("| ", "|")
            .replace(" =", "=")
            .replace(" :", ":")
            .replace(" ,", ",")
            .replace(" |", "|")
    }

    fn remove_comments(&self) -> String {
        let mut trimmed = String::new();
        for line in self.as_ref().lines() {
            let Some(content) = line.split('#').next() else {
                continue;
            };
            let content = content.trim();
            if content.is_empty() {
                continue;
            }
            if !trimmed.is_empty() {
                trimmed += " ";
            }
            trimmed += content;
        }
        trimmed
    }

    fn is_pipeline(&self) -> bool {
        self.as_ref().contains('|')
    }

    fn is_resource_name(&self) -> bool {
        self.operator_name("").contains(':')
    }

    fn operator_name(&self, default: &str) -> String {
        if self.is_pipeline() {
            return default.to_string();
        }
        self.split_into_parameters()
            .get("name")
            .unwrap_or(&default.to_string())
            .to_string()
    }
}

// ----- T E S T S ------------------------------------------------------------------
