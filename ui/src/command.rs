/// What the user typed at the question prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Ask(&'a str),
    Clear,
    Quit,
    Nothing,
}

impl<'a> Command<'a> {
    pub fn parse(input: &'a str) -> Self {
        match input.trim() {
            "" => Command::Nothing,
            "/quit" | "/exit" => Command::Quit,
            "/clear" => Command::Clear,
            question => Command::Ask(question),
        }
    }

    /// Only a reset repaints the page; after a question the agent trace stays
    /// on screen until the next input.
    pub fn redraws_page(self) -> bool {
        matches!(self, Command::Clear)
    }
}
