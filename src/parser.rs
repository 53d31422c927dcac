use crate::access_tree::{AccessTree, TreeOperator};
use crate::errors::ParseError;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Attribute(String),
    Operator(TreeOperator),
    OpenParen,
    CloseParen,
}

/// Token plus the character offset it starts at.
type Lexeme = (Token, usize);

fn tokenize(input: &str) -> Vec<Lexeme> {
    let mut lexemes = Vec::new();
    let mut name = String::new();
    let mut name_start = 0;

    for (offset, c) in input.chars().enumerate() {
        let token = match c {
            '&' => Some(Token::Operator(TreeOperator::And)),
            '|' => Some(Token::Operator(TreeOperator::Or)),
            '(' => Some(Token::OpenParen),
            ')' => Some(Token::CloseParen),
            c if c.is_whitespace() => None,
            c => {
                if name.is_empty() {
                    name_start = offset;
                }
                name.push(c);
                continue;
            }
        };

        if !name.is_empty() {
            lexemes.push((Token::Attribute(std::mem::take(&mut name)), name_start));
        }
        if let Some(token) = token {
            lexemes.push((token, offset));
        }
    }
    if !name.is_empty() {
        lexemes.push((Token::Attribute(name), name_start));
    }
    lexemes
}

/// Parses access formulas such as `(doctor&cardiology)|admin` into an [`AccessTree`].
///
/// `&` binds tighter than `|`, both associate to the left. Whitespace ends an attribute name and is
/// otherwise ignored. Error positions are character offsets into the input, or its length when the
/// input ended early.
pub struct AccessTreeParser {
    lexemes: Vec<Lexeme>,
    cursor: usize,
    end: usize,
}

impl AccessTreeParser {
    pub fn new(input: &str) -> AccessTreeParser {
        AccessTreeParser {
            lexemes: tokenize(input),
            cursor: 0,
            end: input.chars().count(),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.lexemes.get(self.cursor).map(|(token, _)| token)
    }

    fn position(&self) -> usize {
        self.lexemes
            .get(self.cursor)
            .map_or(self.end, |(_, offset)| *offset)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.lexemes.get(self.cursor).map(|(token, _)| token.clone());
        self.cursor += 1;
        token
    }

    // atom := attribute | '(' disjunction ')'
    fn parse_atom(&mut self) -> Result<AccessTree, ParseError> {
        let position = self.position();
        match self.next() {
            Some(Token::Attribute(name)) => Ok(AccessTree::leaf(&name)),
            Some(Token::OpenParen) => {
                let inner = self.parse_disjunction()?;
                match self.next() {
                    Some(Token::CloseParen) => Ok(inner),
                    _ => Err(ParseError::new("Expected ')'", position)),
                }
            }
            Some(token) => Err(ParseError::new(
                format!("Expected attribute but got {:?}", token).as_str(),
                position,
            )),
            None => Err(ParseError::new("Expected attribute but got end of input", position)),
        }
    }

    fn parse_chain(
        &mut self,
        operator: TreeOperator,
        operand: fn(&mut Self) -> Result<AccessTree, ParseError>,
    ) -> Result<AccessTree, ParseError> {
        let mut tree = operand(self)?;
        while self.peek() == Some(&Token::Operator(operator.clone())) {
            self.cursor += 1;
            let right = operand(self)?;
            tree = match operator {
                TreeOperator::And => AccessTree::and(tree, right),
                TreeOperator::Or => AccessTree::or(tree, right),
            };
        }
        Ok(tree)
    }

    // conjunction := atom ('&' atom)*
    fn parse_conjunction(&mut self) -> Result<AccessTree, ParseError> {
        self.parse_chain(TreeOperator::And, Self::parse_atom)
    }

    // disjunction := conjunction ('|' conjunction)*
    fn parse_disjunction(&mut self) -> Result<AccessTree, ParseError> {
        self.parse_chain(TreeOperator::Or, Self::parse_conjunction)
    }

    /// Parses the formula into a tree whose leaves carry document-order indices.
    pub fn parse(&mut self) -> Result<AccessTree, ParseError> {
        self.cursor = 0;
        let mut tree = self.parse_disjunction()?;
        if let Some(token) = self.peek() {
            return Err(ParseError::new(
                format!("Unexpected {:?} after complete formula", token).as_str(),
                self.position(),
            ));
        }
        tree.assign_indices();
        Ok(tree)
    }
}
