//! Doc comment association.
//!
//! Runs after a grammar has built the program. Every documentable node is
//! visited in source order; a node takes the run of consecutive comment
//! lines directly above it as its doc and a trailing comment on its own
//! line as its tail. Each comment is claimed by at most one node.

use std::collections::HashMap;

use log::trace;
use wctl_core::{
    ast::{Doc, EnumDef, Message, OptionDecl, Program},
    span::LineIndex,
};

use crate::tokens::{PositionedToken, Token};

struct Comment<'a> {
    start: usize,
    text: &'a str,
    /// Nothing but whitespace precedes the comment on its line.
    own_line: bool,
    claimed: bool,
}

/// Attach the comments in `tokens` to the nodes of `program`.
pub(crate) fn attach(program: &mut Program, source: &str, tokens: &[PositionedToken<'_>]) {
    let index = LineIndex::new(source);
    let mut comments = Vec::new();
    let mut by_line = HashMap::new();
    let mut line_has_code = false;

    for token in tokens {
        match token.token {
            Token::Newline => line_has_code = false,
            Token::Whitespace => {}
            Token::LineComment(text) => {
                by_line.insert(index.line(token.span.start()), comments.len());
                comments.push(Comment {
                    start: token.span.start(),
                    text,
                    own_line: !line_has_code,
                    claimed: false,
                });
            }
            _ => line_has_code = true,
        }
    }
    if comments.is_empty() {
        return;
    }

    let mut targets = Vec::new();
    program_targets(program, &mut targets);
    targets.sort_by_key(|(offset, _)| *offset);

    for (offset, doc) in targets {
        let line = index.line(offset);

        if let Some(&at) = by_line.get(&line) {
            let comment = &mut comments[at];
            if !comment.claimed && !comment.own_line && comment.start > offset {
                comment.claimed = true;
                doc.tail = Some(comment.text.to_string());
            }
        }

        let mut above = Vec::new();
        let mut current = line;
        while current > 1 {
            current -= 1;
            match by_line.get(&current) {
                Some(&at) if comments[at].own_line && !comments[at].claimed => above.push(at),
                _ => break,
            }
        }
        for &at in above.iter().rev() {
            comments[at].claimed = true;
            doc.lines.push(comments[at].text.to_string());
        }
    }

    trace!(
        claimed = comments.iter().filter(|c| c.claimed).count(),
        total = comments.len();
        "Attached doc comments"
    );
}

type Targets<'p> = Vec<(usize, &'p mut Doc)>;

fn program_targets<'p>(program: &'p mut Program, out: &mut Targets<'p>) {
    out.push((program.package.name.span().start(), &mut program.package.doc));
    for import in &mut program.imports {
        out.push((import.file.span().start(), &mut import.doc));
    }
    option_targets(&mut program.options, out);
    for def in &mut program.enums {
        enum_targets(def, out);
    }
    for message in &mut program.messages {
        message_targets(message, out);
    }
    for service in &mut program.services {
        out.push((service.name.span().start(), &mut service.doc));
        option_targets(&mut service.options, out);
        for method in &mut service.methods {
            out.push((method.name.span().start(), &mut method.doc));
            option_targets(&mut method.options, out);
        }
    }
    for project in &mut program.projects {
        out.push((project.name.span().start(), &mut project.doc));
        for area in project.areas.values_mut() {
            option_targets(&mut area.options, out);
        }
    }
}

fn option_targets<'p>(options: &'p mut [OptionDecl], out: &mut Targets<'p>) {
    for option in options {
        out.push((option.key.span().start(), &mut option.doc));
    }
}

fn enum_targets<'p>(def: &'p mut EnumDef, out: &mut Targets<'p>) {
    out.push((def.name.span().start(), &mut def.doc));
    for value in &mut def.values {
        out.push((value.name.span().start(), &mut value.doc));
    }
    option_targets(&mut def.options, out);
}

fn message_targets<'p>(message: &'p mut Message, out: &mut Targets<'p>) {
    out.push((message.name.span().start(), &mut message.doc));
    for field in &mut message.fields {
        out.push((field.name.span().start(), &mut field.doc));
        option_targets(&mut field.options, out);
    }
    option_targets(&mut message.options, out);
    for def in &mut message.enums {
        enum_targets(def, out);
    }
    for sub in &mut message.messages {
        message_targets(sub, out);
    }
}
