//! EDSL generator
//!
//! Deterministic pretty-printer from a SeqJson sequence to EDSL source text.
//! Identical input always produces byte-identical output.
//!
//! Layout rules:
//! - steps sit six columns in and every step ends with `,`
//! - chained builder calls sit two columns deeper than the step they extend
//! - request entries and variable declarations are comma-separated with no
//!   trailing comma
//! - generic objects print their keys sorted

use crate::types::{
    Argument, ArgumentValue, Metadata, Model, Request, RequestTiming, Sequence, Step, StepKind,
    VariableDecl,
};

use super::normalize::{NormalizedArgument, Normalizer, RenderedValue};
use super::time::{time_prefix, TimeTagError};
use super::writer::{quote, write_entry, write_object_entries, EdslWriter};

pub struct Generator<'a> {
    normalizer: Normalizer<'a>,
}

impl<'a> Generator<'a> {
    pub fn new(normalizer: Normalizer<'a>) -> Self {
        Self { normalizer }
    }

    /// Write the whole `export default () => Sequence.new({...});` module.
    pub fn write_sequence(
        &self,
        out: &mut EdslWriter,
        sequence: &Sequence,
    ) -> Result<(), TimeTagError> {
        out.line(0, "export default () =>");
        out.line(2, "Sequence.new({");
        out.line(4, &format!("seqId: {},", quote(&sequence.id)));

        out.indent(4);
        if sequence.metadata.is_empty() {
            out.push("metadata: {},\n");
        } else {
            out.push("metadata: {\n");
            write_object_entries(out, &sequence.metadata, 6);
            out.line(4, "},");
        }

        write_declarations(out, "locals", &sequence.locals);
        write_declarations(out, "parameters", &sequence.parameters);

        out.line(4, "steps: ({ locals, parameters }) => ([");
        for step in &sequence.steps {
            self.write_step(out, step, 6)?;
            out.push(",\n");
        }
        out.line(4, "]),");

        if !sequence.requests.is_empty() {
            out.line(4, "requests: [");
            for (i, request) in sequence.requests.iter().enumerate() {
                if i > 0 {
                    out.push(",\n");
                }
                self.write_request(out, request, 6)?;
            }
            out.push("\n");
            out.line(4, "],");
        }

        out.indent(2);
        out.push("});");
        Ok(())
    }

    /// Write one step starting at `indent`. No trailing comma or newline.
    pub fn write_step(
        &self,
        out: &mut EdslWriter,
        step: &Step,
        indent: usize,
    ) -> Result<(), TimeTagError> {
        let prefix = time_prefix(&step.time)?;
        let chain = indent + 2;

        out.indent(indent);
        out.push(&prefix);
        out.push(".");

        match &step.kind {
            StepKind::Command { stem } => {
                out.push(stem);
                let args = self.normalizer.normalize(stem, &step.args);
                if !args.is_empty() {
                    out.push("({\n");
                    write_named_arguments(out, &args, indent + 2);
                    out.indent(indent);
                    out.push("})");
                }
                write_description(out, step.description.as_deref(), chain);
                write_metadata(out, &step.metadata, chain);
                write_models(out, &step.models, chain);
            }
            StepKind::Activate(target) | StepKind::Load(target) => {
                let builder = if matches!(step.kind, StepKind::Activate(_)) {
                    "ACTIVATE"
                } else {
                    "LOAD"
                };
                out.push(&format!("{}({})", builder, quote(&target.sequence)));
                write_raw_arguments(out, &step.args, chain);
                write_description(out, step.description.as_deref(), chain);
                if let Some(engine) = target.engine {
                    chain_call(out, chain, &format!("ENGINE({})", engine));
                }
                if let Some(epoch) = &target.epoch {
                    chain_call(out, chain, &format!("EPOCH({})", quote(epoch)));
                }
                write_metadata(out, &step.metadata, chain);
                write_models(out, &step.models, chain);
            }
            StepKind::GroundBlock { name } | StepKind::GroundEvent { name } => {
                let builder = if matches!(step.kind, StepKind::GroundBlock { .. }) {
                    "GROUND_BLOCK"
                } else {
                    "GROUND_EVENT"
                };
                out.push(&format!("{}({})", builder, quote(name)));
                write_raw_arguments(out, &step.args, chain);
                write_description(out, step.description.as_deref(), chain);
                write_metadata(out, &step.metadata, chain);
                write_models(out, &step.models, chain);
            }
        }

        Ok(())
    }

    fn write_request(
        &self,
        out: &mut EdslWriter,
        request: &Request,
        indent: usize,
    ) -> Result<(), TimeTagError> {
        out.indent(indent);
        match &request.timing {
            RequestTiming::Time { time } => {
                out.push(&time_prefix(time)?);
                out.push(".REQUEST(\n");
                out.line(indent + 2, &format!("{},", quote(&request.name)));
            }
            RequestTiming::GroundEpoch { ground_epoch } => {
                out.push("REQUEST(\n");
                out.line(indent + 2, &format!("{},", quote(&request.name)));
                out.line(indent + 2, "{");
                out.line(indent + 4, &format!("delta: {},", quote(&ground_epoch.delta)));
                out.line(indent + 4, &format!("name: {},", quote(&ground_epoch.name)));
                out.line(indent + 2, "},");
            }
        }

        for (i, step) in request.steps.iter().enumerate() {
            if i > 0 {
                out.push(",\n");
            }
            self.write_step(out, step, indent + 2)?;
        }
        out.push("\n");
        out.indent(indent);
        out.push(")");
        write_description(out, request.description.as_deref(), indent + 2);

        Ok(())
    }
}

/* ===================== Sections ===================== */

fn write_declarations(out: &mut EdslWriter, section: &str, decls: &[VariableDecl]) {
    if decls.is_empty() {
        return;
    }
    out.line(4, &format!("{}: [", section));
    for (i, decl) in decls.iter().enumerate() {
        if i > 0 {
            out.push(",\n");
        }
        out.indent(6);
        out.push(&format!("{}({})", decl.var_type.keyword(), quote(&decl.name)));
    }
    out.push("\n");
    out.line(4, "],");
}

/// Command arguments as `label: value,` lines. Diagnostics follow the value.
fn write_named_arguments(out: &mut EdslWriter, args: &[NormalizedArgument], indent: usize) {
    for arg in args {
        out.indent(indent);
        out.push(&format!("{}: ", arg.label));
        match &arg.value {
            RenderedValue::Literal(text) => out.push(text),
            RenderedValue::Accessor(resolution) => out.push(&resolution.accessor),
            RenderedValue::Repeat(rows) if rows.is_empty() => out.push("[]"),
            RenderedValue::Repeat(rows) => {
                out.push("[\n");
                for row in rows {
                    out.line(indent + 2, "{");
                    write_named_arguments(out, row, indent + 4);
                    out.line(indent + 2, "},");
                }
                out.indent(indent);
                out.push("]");
            }
        }
        if let Some(diagnostic) = &arg.diagnostic {
            out.diagnostic(diagnostic);
        }
        out.push(",\n");
    }
}

/* ===================== Chained calls ===================== */

fn chain_call(out: &mut EdslWriter, indent: usize, call: &str) {
    out.push("\n");
    out.indent(indent);
    out.push(".");
    out.push(call);
}

fn write_description(out: &mut EdslWriter, description: Option<&str>, indent: usize) {
    if let Some(description) = description {
        chain_call(out, indent, &format!("DESCRIPTION({})", quote(description)));
    }
}

fn write_metadata(out: &mut EdslWriter, metadata: &Metadata, indent: usize) {
    if metadata.is_empty() {
        return;
    }
    chain_call(out, indent, "METADATA({\n");
    write_object_entries(out, metadata, indent + 2);
    out.indent(indent);
    out.push("})");
}

fn write_models(out: &mut EdslWriter, models: &[Model], indent: usize) {
    if models.is_empty() {
        return;
    }
    chain_call(out, indent, "MODELS([\n");
    for (i, model) in models.iter().enumerate() {
        if i > 0 {
            out.push(",\n");
        }
        out.line(indent + 2, "{");
        out.line(indent + 4, &format!("offset: {},", quote(&model.offset)));
        write_entry(out, "value", &model.value, indent + 4);
        out.line(indent + 4, &format!("variable: {},", quote(&model.variable)));
        out.indent(indent + 2);
        out.push("}");
    }
    out.push("\n");
    out.indent(indent);
    out.push("])");
}

/// Non-command arguments are passed through as `{type, value}` objects.
fn write_raw_arguments(out: &mut EdslWriter, args: &[Argument], indent: usize) {
    if args.is_empty() {
        return;
    }
    chain_call(out, indent, "ARGUMENTS([\n");
    for arg in args {
        write_raw_argument(out, arg, indent + 2);
        out.push(",\n");
    }
    out.indent(indent);
    out.push("])");
}

fn write_raw_argument(out: &mut EdslWriter, arg: &Argument, indent: usize) {
    out.line(indent, "{");
    if let Some(name) = &arg.name {
        out.line(indent + 2, &format!("name: {},", quote(name)));
    }
    out.line(indent + 2, &format!("type: {},", quote(arg.value.type_name())));
    out.indent(indent + 2);
    out.push("value: ");
    match &arg.value {
        ArgumentValue::Number(n) => out.push(&n.to_string()),
        ArgumentValue::String(s) | ArgumentValue::Symbol(s) => out.push(&quote(s)),
        ArgumentValue::Boolean(b) => out.push(&b.to_string()),
        ArgumentValue::Repeat(rows) if rows.is_empty() => out.push("[]"),
        ArgumentValue::Repeat(rows) => {
            out.push("[\n");
            for row in rows {
                out.line(indent + 4, "[");
                for field in row {
                    write_raw_argument(out, field, indent + 6);
                    out.push(",\n");
                }
                out.line(indent + 4, "],");
            }
            out.indent(indent + 2);
            out.push("]");
        }
    }
    out.push(",\n");
    out.indent(indent);
    out.push("}");
}
