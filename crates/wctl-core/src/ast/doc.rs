/// Comments attached to a declaration.
///
/// `lines` holds the consecutive comment lines directly above the
/// declaration, `tail` the comment sharing its first line. Comment text is
/// kept verbatim, including the `//` marker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Doc {
    pub lines: Vec<String>,
    pub tail: Option<String>,
}

impl Doc {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.tail.is_none()
    }
}
