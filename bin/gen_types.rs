//! Generate TypeScript declarations for the API payloads.
//!
//! Usage: cargo run --bin gen_types --features ts-rs -- [OUTPUT]
//! Writes to stdout when no output path is given.

use decisio::{
    ConfidenceLevel, Decision, DecisionContextSnapshot, DecisionContextSnapshotCreate,
    DecisionCreate, DecisionEvaluation, DecisionType, ProjectContext, ProjectContextUpdate,
    RiskLevel, TS,
};

fn main() -> std::io::Result<()> {
    let decls = [
        DecisionType::decl(),
        ConfidenceLevel::decl(),
        RiskLevel::decl(),
        Decision::decl(),
        DecisionCreate::decl(),
        ProjectContext::decl(),
        ProjectContextUpdate::decl(),
        DecisionContextSnapshot::decl(),
        DecisionContextSnapshotCreate::decl(),
        DecisionEvaluation::decl(),
    ];

    let mut out = String::from("// Generated by gen_types. Do not edit.\n\n");
    for decl in decls {
        out.push_str("export ");
        out.push_str(&decl);
        out.push_str("\n\n");
    }

    match std::env::args().nth(1) {
        Some(path) => {
            std::fs::write(&path, out)?;
            eprintln!("Wrote {}", path);
        }
        None => print!("{}", out),
    }
    Ok(())
}
