use std::fmt;

/// The field names of a `@requires` or `@provides` decoration, in the order they were given.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldNames(Vec<String>);

impl FieldNames {
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Space separated names: `"size weight"`.
impl From<&str> for FieldNames {
    fn from(names: &str) -> Self {
        FieldNames(names.split_whitespace().map(str::to_string).collect())
    }
}

impl From<String> for FieldNames {
    fn from(names: String) -> Self {
        FieldNames::from(names.as_str())
    }
}

impl From<Vec<String>> for FieldNames {
    fn from(names: Vec<String>) -> Self {
        FieldNames(names)
    }
}

impl From<Vec<&str>> for FieldNames {
    fn from(names: Vec<&str>) -> Self {
        FieldNames(names.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for FieldNames {
    fn from(names: [&str; N]) -> Self {
        FieldNames(names.into_iter().map(str::to_string).collect())
    }
}

impl fmt::Display for FieldNames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" "))
    }
}
