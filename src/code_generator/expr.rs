//! Translates an N2A equation expression (the free-form text to the
//! right of `=`, or a `@condition`) into a Rust expression string.
//!
//! This is deliberately small: a tokenizer, a precedence-climbing parser
//! producing an [`Expr`] tree, and a renderer that resolves bare
//! identifiers against the owning part's variable table via
//! [`crate::code_generator::resolve::field_name`]. An identifier that
//! isn't one of the part's own variables is assumed to be a free
//! function name (a builtin like `exp`, or a model-level constant) and
//! passed through unresolved — cross-part references are expressed at
//! the [`crate::ast::Variable::reference`] level (`VariableReference`),
//! not token-by-token inside expression text, so this translator only
//! ever resolves names local to `part`.

use crate::ast::EquationSet;

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(String),
    StringLit(String),
    Ident(String),
    Unary(char, Box<Expr>),
    Binary(Box<Expr>, &'static str, Box<Expr>),
    Call(String, Vec<Expr>),
}

struct Tokenizer<'a> {
    chars: std::str::Chars<'a>,
    peeked: Option<char>,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(String),
    StringLit(String),
    Ident(String),
    Op(String),
    LParen,
    RParen,
    Comma,
    End,
}

impl<'a> Tokenizer<'a> {
    fn new(src: &'a str) -> Self {
        Tokenizer { chars: src.chars(), peeked: None }
    }

    fn bump(&mut self) -> Option<char> {
        if let Some(c) = self.peeked.take() {
            return Some(c);
        }
        self.chars.next()
    }

    fn peek(&mut self) -> Option<char> {
        if self.peeked.is_none() {
            self.peeked = self.chars.next();
        }
        self.peeked
    }

    fn tokens(mut self) -> Vec<Token> {
        let mut out = Vec::new();
        loop {
            while matches!(self.peek(), Some(c) if c.is_whitespace()) {
                self.bump();
            }
            let Some(c) = self.peek() else { break };
            match c {
                '(' => {
                    self.bump();
                    out.push(Token::LParen);
                }
                ')' => {
                    self.bump();
                    out.push(Token::RParen);
                }
                ',' => {
                    self.bump();
                    out.push(Token::Comma);
                }
                '"' | '\'' => {
                    let quote = c;
                    self.bump();
                    let mut s = String::new();
                    while let Some(ch) = self.bump() {
                        if ch == quote {
                            break;
                        }
                        s.push(ch);
                    }
                    out.push(Token::StringLit(s));
                }
                c if c.is_ascii_digit() => {
                    let mut s = String::new();
                    while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '.') {
                        s.push(self.bump().unwrap());
                    }
                    if matches!(self.peek(), Some('e' | 'E')) {
                        s.push(self.bump().unwrap());
                        if matches!(self.peek(), Some('+' | '-')) {
                            s.push(self.bump().unwrap());
                        }
                        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                            s.push(self.bump().unwrap());
                        }
                    }
                    out.push(Token::Number(s));
                }
                c if c.is_alphabetic() || c == '_' || c == '$' => {
                    let mut s = String::new();
                    s.push(self.bump().unwrap());
                    while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_' || c == '\'' || c == '.') {
                        s.push(self.bump().unwrap());
                    }
                    out.push(Token::Ident(s));
                }
                '&' | '|' | '=' | '!' | '<' | '>' => {
                    let mut s = String::new();
                    s.push(self.bump().unwrap());
                    if matches!(self.peek(), Some('=')) && s != "!" || (s == "&" && self.peek() == Some('&')) || (s == "|" && self.peek() == Some('|')) {
                        s.push(self.bump().unwrap());
                    }
                    out.push(Token::Op(s));
                }
                '+' | '-' | '*' | '/' | '%' | '^' => {
                    out.push(Token::Op(self.bump().unwrap().to_string()));
                }
                _ => {
                    // Unrecognized punctuation (e.g. stray unit/hint markers
                    // left by the parser): skip it rather than failing
                    // translation outright.
                    self.bump();
                }
            }
        }
        out.push(Token::End);
        out
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn bump(&mut self) -> Token {
        let t = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn parse_expr(&mut self) -> Expr {
        self.parse_binary(0)
    }

    fn parse_binary(&mut self, min_prec: u8) -> Expr {
        let mut lhs = self.parse_unary();
        loop {
            let Some((op, prec, right_assoc)) = self.peek_binop() else { break };
            if prec < min_prec {
                break;
            }
            self.bump();
            let next_min = if right_assoc { prec } else { prec + 1 };
            let rhs = self.parse_binary(next_min);
            lhs = Expr::Binary(Box::new(lhs), op, Box::new(rhs));
        }
        lhs
    }

    fn peek_binop(&self) -> Option<(&'static str, u8, bool)> {
        match self.peek() {
            Token::Op(s) => match s.as_str() {
                "||" => Some(("||", 1, false)),
                "&&" => Some(("&&", 2, false)),
                "==" => Some(("==", 3, false)),
                "!=" => Some(("!=", 3, false)),
                "<" => Some(("<", 4, false)),
                ">" => Some((">", 4, false)),
                "<=" => Some(("<=", 4, false)),
                ">=" => Some((">=", 4, false)),
                "+" => Some(("+", 5, false)),
                "-" => Some(("-", 5, false)),
                "*" => Some(("*", 6, false)),
                "/" => Some(("/", 6, false)),
                "%" => Some(("%", 6, false)),
                "^" => Some(("^", 7, true)),
                _ => None,
            },
            _ => None,
        }
    }

    fn parse_unary(&mut self) -> Expr {
        match self.peek().clone() {
            Token::Op(ref s) if s == "-" => {
                self.bump();
                Expr::Unary('-', Box::new(self.parse_unary()))
            }
            Token::Op(ref s) if s == "!" => {
                self.bump();
                Expr::Unary('!', Box::new(self.parse_unary()))
            }
            Token::Op(ref s) if s == "+" => {
                self.bump();
                self.parse_unary()
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Expr {
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Expr {
        match self.bump() {
            Token::Number(n) => Expr::Number(n),
            Token::StringLit(s) => Expr::StringLit(s),
            Token::Ident(name) => {
                if matches!(self.peek(), Token::LParen) {
                    self.bump();
                    let mut args = Vec::new();
                    if !matches!(self.peek(), Token::RParen) {
                        args.push(self.parse_expr());
                        while matches!(self.peek(), Token::Comma) {
                            self.bump();
                            args.push(self.parse_expr());
                        }
                    }
                    if matches!(self.peek(), Token::RParen) {
                        self.bump();
                    }
                    Expr::Call(name, args)
                } else {
                    Expr::Ident(name)
                }
            }
            Token::LParen => {
                let inner = self.parse_expr();
                if matches!(self.peek(), Token::RParen) {
                    self.bump();
                }
                inner
            }
            _ => Expr::Number("0".to_string()),
        }
    }
}

/// Builtin math function name -> Rust method/free-function rendering.
fn render_call(name: &str, args: &[String]) -> String {
    match (name, args.len()) {
        ("exp", 1) => format!("({}).exp()", args[0]),
        ("ln", 1) | ("log", 1) => format!("({}).ln()", args[0]),
        ("log10", 1) => format!("({}).log10()", args[0]),
        ("sqrt", 1) => format!("({}).sqrt()", args[0]),
        ("abs", 1) => format!("({}).abs()", args[0]),
        ("sin", 1) => format!("({}).sin()", args[0]),
        ("cos", 1) => format!("({}).cos()", args[0]),
        ("tan", 1) => format!("({}).tan()", args[0]),
        ("tanh", 1) => format!("({}).tanh()", args[0]),
        ("floor", 1) => format!("({}).floor()", args[0]),
        ("ceil", 1) => format!("({}).ceil()", args[0]),
        ("round", 1) => format!("({}).round()", args[0]),
        ("sgn", 1) | ("signum", 1) => format!("({}).signum()", args[0]),
        ("min", 2) => format!("({}).min({})", args[0], args[1]),
        ("max", 2) => format!("({}).max({})", args[0], args[1]),
        ("pow", 2) => format!("({}).powf({})", args[0], args[1]),
        ("uniform", 0) => "rand::random::<f64>()".to_string(),
        ("uniform", 1) => format!("(rand::random::<f64>() * ({}))", args[0]),
        _ => format!("{name}({})", args.join(", ")),
    }
}

fn render(expr: &Expr, part: &EquationSet) -> String {
    match expr {
        Expr::Number(n) => n.clone(),
        Expr::StringLit(s) => format!("{s:?}"),
        Expr::Ident(name) => resolve_ident(name, part),
        Expr::Unary('!', inner) => format!("!({})", render(inner, part)),
        Expr::Unary(op, inner) => format!("{op}({})", render(inner, part)),
        Expr::Binary(lhs, op, rhs) => {
            let op = match *op {
                "^" => return format!("({}).powf({})", render(lhs, part), render(rhs, part)),
                other => other,
            };
            format!("({} {op} {})", render(lhs, part), render(rhs, part))
        }
        Expr::Call(name, args) => {
            let rendered_args: Vec<String> = args.iter().map(|a| render(a, part)).collect();
            render_call(name, &rendered_args)
        }
    }
}

/// Resolve a bare identifier against `part`'s own variables; a dotted
/// name (`A.weight`, `$up.x`) walks a connection endpoint alias or
/// container step instead, via
/// [`crate::code_generator::resolve::render_access`]; anything else
/// (math builtins, unresolved externals) is passed through as a plain
/// Rust identifier.
fn resolve_ident(name: &str, part: &EquationSet) -> String {
    match name {
        "pi" => return "std::f64::consts::PI".to_string(),
        "e" if part.find_variable("e").is_none() => return "std::f64::consts::E".to_string(),
        "inf" | "infinity" => return "f64::INFINITY".to_string(),
        "nan" => return "f64::NAN".to_string(),
        _ => {}
    }
    if part.find_variable(name).is_some() {
        return format!("self.{}", crate::code_generator::resolve::field_name(name));
    }
    if name.contains('.') {
        return resolve_dotted(name, part);
    }
    name.to_string()
}

/// Resolve `head.rest[.rest...]` into a [`VariableReference`] path and
/// render it: `$up` steps ascend to the container, any other leading
/// segment is treated as a connection-endpoint alias (or sub-part name —
/// [`crate::code_generator::resolve::render_access`] renders both the same
/// way, a field-then-`borrow()` step), and the final segment is the
/// target variable name.
fn resolve_dotted(name: &str, part: &EquationSet) -> String {
    let mut segments: Vec<&str> = name.split('.').collect();
    let Some(target_name) = segments.pop() else {
        return name.to_string();
    };
    if segments.is_empty() {
        return name.to_string();
    }
    let steps = segments
        .iter()
        .map(|seg| {
            if *seg == "$up" {
                crate::ast::RefStep::Up
            } else if let Some(binding) = part.connection_bindings.iter().find(|b| b.alias == *seg) {
                crate::ast::RefStep::Endpoint(binding.alias.clone())
            } else {
                crate::ast::RefStep::Down((*seg).to_string())
            }
        })
        .collect();
    let reference = crate::ast::VariableReference {
        steps,
        target_name: target_name.to_string(),
        resolved: true,
    };
    crate::code_generator::resolve::render_access(&reference)
}

/// Translate one N2A expression string into a Rust expression, resolving
/// identifiers that name a variable of `part` to `self.<field>`.
pub fn translate(source: &str, part: &EquationSet) -> String {
    let tokens = Tokenizer::new(source).tokens();
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_expr();
    render(&expr, part)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Variable;

    fn part_with(names: &[&str]) -> EquationSet {
        let mut part = EquationSet::new("P");
        for n in names {
            part.variables.push(Variable::new(*n));
        }
        part
    }

    #[test]
    fn resolves_a_bare_identifier_to_a_self_field() {
        let part = part_with(&["x"]);
        assert_eq!(translate("-x", &part), "-(self.x)");
    }

    #[test]
    fn leaves_unknown_identifiers_unresolved() {
        let part = part_with(&["x"]);
        assert_eq!(translate("exp(x)", &part), "(self.x).exp()");
    }

    #[test]
    fn renders_binary_arithmetic_with_precedence() {
        let part = part_with(&["x", "y"]);
        assert_eq!(translate("x + y * 2", &part), "(self.x + (self.y * 2))");
    }

    #[test]
    fn renders_comparison_conditions() {
        let part = part_with(&["V"]);
        assert_eq!(translate("V > 0", &part), "(self.V > 0)");
    }

    #[test]
    fn renders_power_as_powf() {
        let part = part_with(&["x"]);
        assert_eq!(translate("x^2", &part), "(self.x).powf(2)");
    }

    #[test]
    fn renders_dollar_prefixed_specials_via_field_mangling() {
        let part = part_with(&["$init"]);
        assert_eq!(translate("$init", &part), "self.dollar_init");
    }

    #[test]
    fn numeric_literal_passes_through_unchanged() {
        let part = EquationSet::new("P");
        assert_eq!(translate("3.14", &part), "3.14");
    }

    #[test]
    fn string_literal_round_trips_as_a_rust_string_literal() {
        let part = EquationSet::new("P");
        assert_eq!(translate("\"hello\"", &part), "\"hello\"");
    }

    #[test]
    fn resolves_a_connection_endpoint_alias_to_a_borrow_chain() {
        use crate::ast::ConnectionBinding;
        let mut part = EquationSet::new("Synapse");
        part.connection_bindings.push(ConnectionBinding {
            alias: "A".into(),
            endpoint: "Neuron".into(),
            index: 0,
            resolution: crate::ast::VariableReference::unresolved("A"),
        });
        assert_eq!(translate("A.weight", &part), "self.A.borrow().weight");
    }

    #[test]
    fn resolves_up_step_to_the_container() {
        let part = EquationSet::new("Sub");
        assert_eq!(translate("$up.x", &part), "self.container.borrow().x");
    }

    #[test]
    fn resolves_nested_dotted_path() {
        let part = EquationSet::new("Sub");
        assert_eq!(translate("$up.$up.x", &part), "self.container.borrow().container.borrow().x");
    }
}
