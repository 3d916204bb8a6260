//! Typed ffmpeg filter-graph construction.
//!
//! The graph is an ordered list of [`FilterNode`]s, each consuming streams
//! produced by raw inputs or earlier nodes and producing one labelled output.
//! Serialization to `-filter_complex` text happens in one place, as does
//! drawtext escaping, so stream-label bookkeeping stays testable without
//! invoking ffmpeg.

use std::fmt;

use crate::error::{RenderError, RenderResult};

/// Output label of the last node, mapped by the encoder's `-map`.
pub const FINAL_STREAM: &str = "final";

pub const TARGET_WIDTH: u32 = 1080;
pub const TARGET_HEIGHT: u32 = 1920;

const TITLE_FONT_SIZE: u32 = 48;
const TITLE_Y: u32 = 100;
const TITLE_BOX_OPACITY: f32 = 0.7;
const TITLE_BOX_BORDER: u32 = 10;

const CODE_INSET_WIDTH: u32 = 900;
const CODE_INSET_HEIGHT: u32 = 500;
const CODE_INSET_X: i32 = 90;
const CODE_INSET_Y: i32 = 600;

/// A stream identifier: either a raw input's video stream or a named label
/// produced by an earlier node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamLabel {
    Input(usize),
    Named(String),
}

impl StreamLabel {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }
}

impl fmt::Display for StreamLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input(idx) => write!(f, "{idx}:v"),
            Self::Named(name) => write!(f, "{name}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    /// Scale to `width` x `height`. `cover` keeps the aspect ratio and sizes
    /// up to cover the target (pair with [`FilterOp::Crop`]); otherwise the
    /// stream is stretched to the exact size.
    Scale { width: u32, height: u32, cover: bool },
    Crop { width: u32, height: u32 },
    /// Title overlay: centered horizontally, boxed for legibility. The text
    /// is stored raw; escaping happens during serialization.
    DrawText { text: String },
    Overlay { x: i32, y: i32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterNode {
    pub inputs: Vec<StreamLabel>,
    pub op: FilterOp,
    pub output: StreamLabel,
}

#[derive(Debug, Clone, Default)]
pub struct FilterGraph {
    pub nodes: Vec<FilterNode>,
}

impl FilterGraph {
    fn push(&mut self, inputs: Vec<StreamLabel>, op: FilterOp, output: StreamLabel) {
        self.nodes.push(FilterNode { inputs, op, output });
    }

    /// Check the label invariants against `raw_inputs` available input
    /// streams. Violations indicate a builder bug and abort the render.
    pub fn validate(&self, raw_inputs: usize) -> RenderResult<()> {
        if self.nodes.is_empty() {
            return Err(RenderError::graph("filter graph has no nodes"));
        }

        let mut produced: Vec<&str> = Vec::new();
        for node in &self.nodes {
            for input in &node.inputs {
                match input {
                    StreamLabel::Input(idx) => {
                        if *idx >= raw_inputs {
                            return Err(RenderError::graph(format!(
                                "node consumes raw input {idx} but only {raw_inputs} inputs exist"
                            )));
                        }
                    }
                    StreamLabel::Named(name) => {
                        if !produced.contains(&name.as_str()) {
                            return Err(RenderError::graph(format!(
                                "node consumes stream '{name}' before it is produced"
                            )));
                        }
                    }
                }
            }
            let StreamLabel::Named(out) = &node.output else {
                return Err(RenderError::graph(
                    "node output must be a named stream, not a raw input",
                ));
            };
            if produced.contains(&out.as_str()) {
                return Err(RenderError::graph(format!(
                    "stream '{out}' is produced twice"
                )));
            }
            produced.push(out);
        }

        if produced.last() != Some(&FINAL_STREAM) {
            return Err(RenderError::graph(format!(
                "last node must produce '{FINAL_STREAM}'"
            )));
        }
        Ok(())
    }

    /// Serialize to `-filter_complex` syntax.
    pub fn serialize(&self) -> String {
        self.nodes
            .iter()
            .map(serialize_node)
            .collect::<Vec<_>>()
            .join(";")
    }
}

fn serialize_node(node: &FilterNode) -> String {
    let inputs: String = node.inputs.iter().map(|l| format!("[{l}]")).collect();
    let op = match &node.op {
        FilterOp::Scale {
            width,
            height,
            cover,
        } => {
            if *cover {
                format!("scale={width}:{height}:force_original_aspect_ratio=increase")
            } else {
                format!("scale={width}:{height}")
            }
        }
        FilterOp::Crop { width, height } => format!("crop={width}:{height}"),
        FilterOp::DrawText { text } => format!(
            "drawtext=text='{}':fontsize={TITLE_FONT_SIZE}:fontcolor=white:\
             x=(w-text_w)/2:y={TITLE_Y}:box=1:boxcolor=black@{TITLE_BOX_OPACITY}:\
             boxborderw={TITLE_BOX_BORDER}",
            escape_drawtext(text)
        ),
        FilterOp::Overlay { x, y } => format!("overlay={x}:{y}"),
    };
    format!("{inputs}{op}[{}]", node.output)
}

/// Escape drawtext-sensitive characters (backslash, single quote, colon).
///
/// Already-escaped pairs pass through unchanged, so escaping is idempotent.
/// Unescaped occurrences of these characters corrupt the whole filter graph,
/// not just the rendered text.
pub fn escape_drawtext(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek() {
                Some('\\' | '\'' | ':') => {
                    out.push('\\');
                    out.push(chars.next().unwrap());
                }
                _ => out.push_str("\\\\"),
            },
            '\'' | ':' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Build the overlay graph for one render.
///
/// Raw input layout is fixed by the encoder: input 0 is the base visual (the
/// downloaded background, or a solid-color canvas when none was found), input
/// 1 is the code image when present, and the audio file comes last. The
/// canvas is generated at target size, so only a real background gets the
/// scale + crop normalization.
pub fn build_graph(has_background: bool, has_code_image: bool, title: &str) -> FilterGraph {
    let mut graph = FilterGraph::default();
    let mut current = StreamLabel::Input(0);

    if has_background {
        graph.push(
            vec![current],
            FilterOp::Scale {
                width: TARGET_WIDTH,
                height: TARGET_HEIGHT,
                cover: true,
            },
            StreamLabel::named("scaled"),
        );
        graph.push(
            vec![StreamLabel::named("scaled")],
            FilterOp::Crop {
                width: TARGET_WIDTH,
                height: TARGET_HEIGHT,
            },
            StreamLabel::named("bg"),
        );
        current = StreamLabel::named("bg");
    }

    graph.push(
        vec![current],
        FilterOp::DrawText {
            text: title.to_string(),
        },
        StreamLabel::named("titled"),
    );

    if has_code_image {
        graph.push(
            vec![StreamLabel::Input(1)],
            FilterOp::Scale {
                width: CODE_INSET_WIDTH,
                height: CODE_INSET_HEIGHT,
                cover: false,
            },
            StreamLabel::named("code"),
        );
        graph.push(
            vec![StreamLabel::named("titled"), StreamLabel::named("code")],
            FilterOp::Overlay {
                x: CODE_INSET_X,
                y: CODE_INSET_Y,
            },
            StreamLabel::named(FINAL_STREAM),
        );
    } else {
        // Whatever branch produced the current stream, the encoder maps one
        // predictable label.
        graph
            .nodes
            .last_mut()
            .expect("graph always contains the drawtext node")
            .output = StreamLabel::named(FINAL_STREAM);
    }

    graph
}

#[cfg(test)]
mod tests {
    use super::*;

    fn final_label(graph: &FilterGraph) -> &StreamLabel {
        &graph.nodes.last().unwrap().output
    }

    #[test]
    fn all_presence_combinations_end_in_the_final_stream() {
        for (bg, code) in [(false, false), (false, true), (true, false), (true, true)] {
            let graph = build_graph(bg, code, "Title");
            assert!(!graph.nodes.is_empty(), "bg={bg} code={code}");
            assert_eq!(
                final_label(&graph),
                &StreamLabel::named(FINAL_STREAM),
                "bg={bg} code={code}"
            );
            let raw_inputs = 1 + usize::from(code) + 1;
            graph.validate(raw_inputs).unwrap();
        }
    }

    #[test]
    fn background_graph_scales_then_crops_to_vertical() {
        let graph = build_graph(true, false, "Loops");
        let text = graph.serialize();
        assert!(text.starts_with(
            "[0:v]scale=1080:1920:force_original_aspect_ratio=increase[scaled];\
             [scaled]crop=1080:1920[bg];[bg]drawtext=text='Loops'"
        ));
        assert!(text.ends_with("[final]"));
    }

    #[test]
    fn canvas_only_graph_is_a_single_drawtext() {
        let graph = build_graph(false, false, "Loops");
        assert_eq!(graph.nodes.len(), 1);
        let text = graph.serialize();
        assert!(text.starts_with("[0:v]drawtext=text='Loops'"));
        assert!(text.ends_with("[final]"));
    }

    #[test]
    fn code_overlay_consumes_input_one_and_the_titled_stream() {
        let graph = build_graph(true, true, "T");
        let text = graph.serialize();
        assert!(text.contains("[1:v]scale=900:500[code]"));
        assert!(text.contains("[titled][code]overlay=90:600[final]"));
    }

    #[test]
    fn title_is_escaped_in_serialized_drawtext() {
        let graph = build_graph(false, false, r"Rust: don't \ panic");
        let text = graph.serialize();
        assert!(text.contains(r"drawtext=text='Rust\: don\'t \\ panic'"));
    }

    #[test]
    fn escaping_is_idempotent() {
        let once = escape_drawtext(r"a:b'c\d");
        assert_eq!(once, r"a\:b\'c\\d");
        assert_eq!(escape_drawtext(&once), once);
    }

    #[test]
    fn plain_text_is_untouched_by_escaping() {
        assert_eq!(escape_drawtext("Hello World 123"), "Hello World 123");
    }

    #[test]
    fn validate_rejects_empty_graph() {
        let graph = FilterGraph::default();
        assert!(matches!(
            graph.validate(2),
            Err(RenderError::GraphInvariant(_))
        ));
    }

    #[test]
    fn validate_rejects_dangling_stream_reference() {
        let mut graph = FilterGraph::default();
        graph.push(
            vec![StreamLabel::named("ghost")],
            FilterOp::DrawText {
                text: "t".to_string(),
            },
            StreamLabel::named(FINAL_STREAM),
        );
        assert!(matches!(
            graph.validate(2),
            Err(RenderError::GraphInvariant(_))
        ));
    }

    #[test]
    fn validate_rejects_out_of_range_raw_input() {
        let graph = build_graph(true, true, "T");
        // Only two raw inputs: base + audio, no code image input.
        assert!(matches!(
            graph.validate(2),
            Err(RenderError::GraphInvariant(_))
        ));
    }

    #[test]
    fn validate_rejects_wrong_final_label() {
        let mut graph = FilterGraph::default();
        graph.push(
            vec![StreamLabel::Input(0)],
            FilterOp::DrawText {
                text: "t".to_string(),
            },
            StreamLabel::named("titled"),
        );
        assert!(matches!(
            graph.validate(2),
            Err(RenderError::GraphInvariant(_))
        ));
    }
}
