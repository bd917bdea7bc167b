// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
use strata_engine::Node;

#[allow(dead_code)]
pub fn generate_paragraphs(count: usize) -> Vec<Node> {
    (0..count)
        .map(|i| {
            Node::element(
                "paragraph",
                vec![Node::text(format!("Paragraph {i} with some content to edit."))],
            )
        })
        .collect()
}

#[allow(dead_code)]
pub fn generate_outline(sections: usize, items: usize) -> Vec<Node> {
    (0..sections)
        .map(|section| {
            let children = (0..items)
                .map(|item| {
                    Node::element("item", vec![Node::text(format!("Item {section}.{item}"))])
                })
                .collect();
            Node::element("list", children)
        })
        .collect()
}
