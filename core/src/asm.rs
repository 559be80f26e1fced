//! Reader and writer for 68000 assembler project sources.
//!
//! Only the handful of constructs the disassembly uses to lay out data are
//! understood; anything else is kept as an opaque instruction line.
//!
//! ```text
//! ; comment
//! SysFont:                    ; label
//!         incbin "font.bin"   ; binary include
//!         include "other.asm" ; assembler include
//!         align 2             ; or `even`
//!         dc.b "TEXT", 0, $FF ; data (also dc.w / dc.l, $hex 0xhex %bin)
//! ```

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use landstalker_shared::fs::{MAX_ASSET_BYTES, read_file_with_limit, write_file_atomic};

use crate::error::{DataError, Result};

/// How an included file is pulled into the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// `incbin`: raw bytes
    Binary,
    /// `include`: more assembler source
    Assembler,
}

/// An include directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Include {
    pub path: String,
    pub kind: FileType,
}

/// One parsed source construct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Label(String),
    Include(Include),
    Align(u32),
    Data(Vec<u8>),
    Instruction(String),
}

impl Token {
    fn describe(&self) -> &'static str {
        match self {
            Token::Label(_) => "label",
            Token::Include(_) => "include",
            Token::Align(_) => "align",
            Token::Data(_) => "data",
            Token::Instruction(_) => "instruction",
        }
    }
}

/// A sequence of tokens with a read cursor.
#[derive(Debug, Clone, Default)]
pub struct AsmFile {
    path: PathBuf,
    header: Option<(String, String)>,
    tokens: Vec<(Token, usize)>,
    cursor: usize,
    /// Bytes already consumed from the data token under the cursor
    byte_pos: usize,
}

impl AsmFile {
    /// Empty file for writing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and parse a source file.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = read_file_with_limit(path, MAX_ASSET_BYTES).map_err(|e| DataError::io(path, e))?;
        let text = String::from_utf8(bytes).map_err(|_| DataError::Syntax {
            path: path.to_path_buf(),
            line: 0,
            message: "file is not valid UTF-8".into(),
        })?;
        Self::parse(&text, path)
    }

    /// Parse source text. `path` is only used in error messages.
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        let mut file = Self {
            path: path.to_path_buf(),
            ..Self::default()
        };
        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let mut rest = strip_comment(raw).trim();

            if let Some((label, tail)) = split_label(rest) {
                file.tokens.push((Token::Label(label.to_string()), line));
                rest = tail.trim();
            }
            if rest.is_empty() {
                continue;
            }

            let token = parse_statement(rest).map_err(|message| DataError::Syntax {
                path: path.to_path_buf(),
                line,
                message,
            })?;
            file.tokens.push((token, line));
        }
        Ok(file)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter().map(|(token, _)| token)
    }

    /// True once every token has been read.
    pub fn at_end(&self) -> bool {
        self.cursor >= self.tokens.len()
    }

    // ========================================================================
    // Reading
    // ========================================================================

    /// Move the cursor just past `label`.
    pub fn goto(&mut self, label: &str) -> Result<()> {
        let index = self
            .tokens
            .iter()
            .position(|(token, _)| matches!(token, Token::Label(l) if l == label))
            .ok_or_else(|| DataError::LabelNotFound {
                label: label.to_string(),
                path: self.path.clone(),
            })?;
        self.cursor = index + 1;
        self.byte_pos = 0;
        Ok(())
    }

    pub fn read_label(&mut self) -> Result<String> {
        match self.peek("label")? {
            Token::Label(label) => {
                let label = label.clone();
                self.advance();
                Ok(label)
            }
            other => Err(self.unexpected("label", other)),
        }
    }

    pub fn read_include(&mut self) -> Result<Include> {
        match self.peek("include")? {
            Token::Include(include) => {
                let include = include.clone();
                self.advance();
                Ok(include)
            }
            other => Err(self.unexpected("include", other)),
        }
    }

    /// Jump to `label` and read the include that follows it.
    pub fn include_after(&mut self, label: &str) -> Result<Include> {
        self.goto(label)?;
        self.read_include()
    }

    /// Read one byte, continuing across consecutive data directives.
    ///
    /// Empty directives such as `dc.b ""` contribute no bytes and are skipped.
    pub fn read_byte(&mut self) -> Result<u8> {
        loop {
            match self.peek("data")? {
                Token::Data(bytes) => match bytes.get(self.byte_pos) {
                    Some(&byte) => {
                        let len = bytes.len();
                        self.byte_pos += 1;
                        if self.byte_pos == len {
                            self.advance();
                        }
                        return Ok(byte);
                    }
                    None => self.advance(),
                },
                other => return Err(self.unexpected("data", other)),
            }
        }
    }

    /// Read bytes up to and including a zero terminator.
    pub fn read_cstring(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        loop {
            match self.read_byte()? {
                0 => return Ok(out),
                b => out.push(b),
            }
        }
    }

    fn peek(&self, expected: &str) -> Result<&Token> {
        match self.tokens.get(self.cursor) {
            Some((token, _)) => Ok(token),
            None => Err(DataError::Syntax {
                path: self.path.clone(),
                line: self.tokens.last().map_or(0, |(_, line)| *line),
                message: format!("expected {expected}, found end of file"),
            }),
        }
    }

    fn advance(&mut self) {
        self.cursor += 1;
        self.byte_pos = 0;
    }

    fn unexpected(&self, expected: &str, found: &Token) -> DataError {
        DataError::Syntax {
            path: self.path.clone(),
            line: self.tokens.get(self.cursor).map_or(0, |(_, line)| *line),
            message: format!("expected {expected}, found {}", found.describe()),
        }
    }

    // ========================================================================
    // Writing
    // ========================================================================

    /// Set the comment block written at the top of the file.
    pub fn write_file_header(&mut self, path: &str, description: &str) -> &mut Self {
        self.header = Some((path.to_string(), description.to_string()));
        self
    }

    pub fn push(&mut self, token: Token) -> &mut Self {
        self.tokens.push((token, 0));
        self
    }

    pub fn label(&mut self, name: &str) -> &mut Self {
        self.push(Token::Label(name.to_string()))
    }

    pub fn include(&mut self, path: &str, kind: FileType) -> &mut Self {
        self.push(Token::Include(Include {
            path: path.to_string(),
            kind,
        }))
    }

    pub fn align(&mut self, alignment: u32) -> &mut Self {
        self.push(Token::Align(alignment))
    }

    pub fn data(&mut self, bytes: &[u8]) -> &mut Self {
        self.push(Token::Data(bytes.to_vec()))
    }

    pub fn instruction(&mut self, text: &str) -> &mut Self {
        self.push(Token::Instruction(text.to_string()))
    }

    /// Render the whole file as source text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some((path, description)) = &self.header {
            let rule = format!("; {}", "-".repeat(75));
            let _ = writeln!(out, "{rule}\n; {path}\n; {description}\n{rule}\n");
        }
        for (token, _) in &self.tokens {
            match token {
                Token::Label(label) => {
                    let _ = writeln!(out, "{label}:");
                }
                Token::Include(Include { path, kind }) => {
                    let directive = match kind {
                        FileType::Binary => "incbin",
                        FileType::Assembler => "include",
                    };
                    let _ = writeln!(out, "\t\t{directive} \"{path}\"");
                }
                Token::Align(2) => out.push_str("\t\teven\n"),
                Token::Align(n) => {
                    let _ = writeln!(out, "\t\talign {n}");
                }
                Token::Data(bytes) => {
                    for chunk in bytes.chunks(16) {
                        let _ = writeln!(out, "\t\tdc.b {}", render_bytes(chunk));
                    }
                }
                Token::Instruction(text) => {
                    let _ = writeln!(out, "\t\t{text}");
                }
            }
        }
        out
    }

    /// Write the rendered source to `path` atomically, creating parents.
    pub fn write_file(&self, path: &Path) -> Result<()> {
        write_file_atomic(path, self.render().as_bytes()).map_err(|e| DataError::io(path, e))?;
        tracing::debug!(path = %path.display(), tokens = self.tokens.len(), "Wrote assembler source");
        Ok(())
    }
}

// ============================================================================
// Parsing helpers
// ============================================================================

fn strip_comment(line: &str) -> &str {
    let mut quote = None;
    for (i, c) in line.char_indices() {
        match (c, quote) {
            ('"' | '\'', None) => quote = Some(c),
            (c, Some(q)) if c == q => quote = None,
            (';', None) => return &line[..i],
            _ => {}
        }
    }
    line
}

fn is_label_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '.'
}

fn is_label_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '@')
}

/// Split `Name: rest` into the label and whatever follows it.
fn split_label(line: &str) -> Option<(&str, &str)> {
    let colon = line.find(':')?;
    let name = &line[..colon];
    let mut chars = name.chars();
    let first = chars.next()?;
    (is_label_start(first) && chars.all(is_label_char)).then(|| (name, &line[colon + 1..]))
}

fn parse_statement(text: &str) -> std::result::Result<Token, String> {
    let (mnemonic, args) = match text.find(char::is_whitespace) {
        Some(i) => (&text[..i], text[i..].trim()),
        None => (text, ""),
    };

    match mnemonic.to_ascii_lowercase().as_str() {
        "incbin" => Ok(Token::Include(Include {
            path: unquote(args)?,
            kind: FileType::Binary,
        })),
        "include" => Ok(Token::Include(Include {
            path: unquote(args)?,
            kind: FileType::Assembler,
        })),
        "even" => Ok(Token::Align(2)),
        "align" => {
            let n = parse_number(args)?;
            u32::try_from(n)
                .ok()
                .filter(|&n| n > 0)
                .map(Token::Align)
                .ok_or_else(|| format!("invalid alignment {args}"))
        }
        "dc.b" => parse_data(args, 1).map(Token::Data),
        "dc.w" => parse_data(args, 2).map(Token::Data),
        "dc.l" => parse_data(args, 4).map(Token::Data),
        _ => Ok(Token::Instruction(text.to_string())),
    }
}

fn unquote(arg: &str) -> std::result::Result<String, String> {
    let arg = arg.trim();
    let inner = arg
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| arg.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
        .unwrap_or(arg);
    if inner.is_empty() {
        return Err("missing file name".into());
    }
    Ok(inner.to_string())
}

/// Split a directive's operands on commas outside quotes.
fn split_operands(args: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut quote = None;
    let mut start = 0;
    for (i, c) in args.char_indices() {
        match (c, quote) {
            ('"' | '\'', None) => quote = Some(c),
            (c, Some(q)) if c == q => quote = None,
            (',', None) => {
                out.push(args[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(args[start..].trim());
    out
}

fn parse_data(args: &str, width: usize) -> std::result::Result<Vec<u8>, String> {
    if args.is_empty() {
        return Err("data directive without operands".into());
    }

    let mut out = Vec::new();
    for operand in split_operands(args) {
        let quoted = operand
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .or_else(|| operand.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')));
        if let Some(text) = quoted {
            if width != 1 {
                return Err(format!("string operand in {}-byte data", width));
            }
            for c in text.chars() {
                out.push(u8::try_from(u32::from(c)).map_err(|_| format!("character {c:?} out of range"))?);
            }
            continue;
        }

        let value = parse_number(operand)?;
        let bits = width as u32 * 8;
        let min = -(1i64 << (bits - 1));
        let max = (1i64 << bits) - 1;
        if value < min || value > max {
            return Err(format!("value {operand} does not fit in {width} bytes"));
        }
        let be = (value as u64).to_be_bytes();
        out.extend_from_slice(&be[8 - width..]);
    }
    Ok(out)
}

fn parse_number(text: &str) -> std::result::Result<i64, String> {
    let text = text.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let parsed = if let Some(hex) = digits.strip_prefix('$') {
        i64::from_str_radix(hex, 16)
    } else if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16)
    } else if let Some(bin) = digits.strip_prefix('%') {
        i64::from_str_radix(bin, 2)
    } else {
        digits.parse::<i64>()
    };
    let value = parsed.map_err(|_| format!("invalid number {text:?}"))?;
    Ok(if negative { -value } else { value })
}

fn is_printable(b: u8) -> bool {
    (0x20..0x7F).contains(&b) && b != b'"'
}

/// Render bytes as `dc.b` operands, keeping printable runs as strings.
fn render_bytes(bytes: &[u8]) -> String {
    let mut parts = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let run = bytes[i..].iter().take_while(|&&b| is_printable(b)).count();
        if run >= 2 {
            let text: String = bytes[i..i + run].iter().map(|&b| b as char).collect();
            parts.push(format!("\"{text}\""));
            i += run;
        } else {
            parts.push(format!("${:02X}", bytes[i]));
            i += 1;
        }
    }
    parts.join(", ")
}
