//! Errors that end a `dfwarp` run.

use std::io::{self, Write};
use dfwarp_core::WarpError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Could not read the input images.")]
    InputVolume(#[source] anyhow::Error),

    #[error("Could not read the input deformation field.")]
    DisplacementField(#[source] anyhow::Error),

    #[error(transparent)]
    Warp(#[from] WarpError),

    #[error("Could not write the output image.")]
    Output(#[source] anyhow::Error),

    #[error("Could not print diagnostics.")]
    Report(#[from] std::io::Error),
}

impl PipelineError {
    /// Messages of this error and every underlying cause, outermost first.
    pub fn chain(&self) -> Vec<String> {
        let mut messages = vec![self.to_string()];
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            messages.push(cause.to_string());
            source = cause.source();
        }
        messages
    }

    /// Print the message followed by its causes, one per line.
    pub fn report<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for (depth, message) in self.chain().iter().enumerate() {
            if depth == 0 {
                writeln!(out, "{message}")?;
            } else {
                writeln!(out, "  caused by: {message}")?;
            }
        }
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_failures_use_fixed_messages() {
        let err = PipelineError::InputVolume(anyhow::anyhow!("no such file"));
        assert_eq!(err.to_string(), "Could not read the input images.");
        let err = PipelineError::DisplacementField(anyhow::anyhow!("no such file"));
        assert_eq!(err.to_string(), "Could not read the input deformation field.");
    }

    #[test]
    fn test_chain_lists_causes() {
        let cause = anyhow::anyhow!("permission denied").context("Failed to read NIfTI file a.nii");
        let chain = PipelineError::InputVolume(cause).chain();
        assert_eq!(
            chain,
            vec![
                "Could not read the input images.".to_string(),
                "Failed to read NIfTI file a.nii".to_string(),
                "permission denied".to_string(),
            ]
        );
    }

    #[test]
    fn test_report_prints_message_then_causes() {
        let cause = anyhow::anyhow!("no such file").context("Failed to read NIfTI file f.nii");
        let mut out = Vec::new();
        PipelineError::DisplacementField(cause).report(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Could not read the input deformation field.\n  \
             caused by: Failed to read NIfTI file f.nii\n  \
             caused by: no such file\n"
        );
    }

    #[test]
    fn test_warp_errors_are_transparent() {
        let err = PipelineError::from(WarpError::geometry_mismatch("origin differs"));
        assert_eq!(err.to_string(), "Geometry mismatch: origin differs");
    }
}
