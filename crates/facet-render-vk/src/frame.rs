//! Per-frame command stream and present-result classification.
//!
//! The recording sequence is produced by one ordered emitter so the
//! production recorder and the tests share a single source of truth for
//! what a frame contains and in what order.

use ash::vk;

use crate::error::RenderError;

pub(crate) const TRIANGLE_VERTEX_COUNT: u32 = 3;
pub(crate) const TRIANGLE_INSTANCE_COUNT: u32 = 1;

/// One recorded command. Viewport and scissor are dynamic pipeline state and
/// must be set inside every recorded frame, before the draw.
#[derive(Debug, Clone, Copy)]
pub(crate) enum FrameCmd {
    Begin,
    BeginRenderPass { image_index: u32, clear: [f32; 4] },
    BindPipeline,
    SetViewport(vk::Viewport),
    SetScissor(vk::Rect2D),
    Draw { vertex_count: u32, instance_count: u32 },
    EndRenderPass,
    End,
}

/// Emit the fixed command sequence for one frame. A failing `emit` aborts
/// the whole frame; there is no partial recovery mid-recording.
pub(crate) fn emit_frame_commands<E>(
    extent: vk::Extent2D,
    image_index: u32,
    clear: [f32; 4],
    emit: &mut impl FnMut(FrameCmd) -> Result<(), E>,
) -> Result<(), E> {
    emit(FrameCmd::Begin)?;
    emit(FrameCmd::BeginRenderPass { image_index, clear })?;
    emit(FrameCmd::BindPipeline)?;
    emit(FrameCmd::SetViewport(vk::Viewport {
        x: 0.0,
        y: 0.0,
        width: extent.width as f32,
        height: extent.height as f32,
        min_depth: 0.0,
        max_depth: 1.0,
    }))?;
    emit(FrameCmd::SetScissor(vk::Rect2D {
        offset: vk::Offset2D { x: 0, y: 0 },
        extent,
    }))?;
    emit(FrameCmd::Draw {
        vertex_count: TRIANGLE_VERTEX_COUNT,
        instance_count: TRIANGLE_INSTANCE_COUNT,
    })?;
    emit(FrameCmd::EndRenderPass)?;
    emit(FrameCmd::End)
}

/// What a completed frame means for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The image was queued for presentation (possibly suboptimally).
    Presented,
    /// The surface no longer matches the swapchain. The frame was dropped;
    /// all other resources remain valid and the loop may continue.
    SurfaceOutOfDate,
}

pub(crate) fn classify_present(
    result: Result<bool, vk::Result>,
) -> Result<FrameOutcome, RenderError> {
    match result {
        Ok(_suboptimal) => Ok(FrameOutcome::Presented),
        Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(FrameOutcome::SurfaceOutOfDate),
        Err(source) => Err(RenderError::Frame {
            op: "queue present",
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(cmd: &FrameCmd) -> &'static str {
        match cmd {
            FrameCmd::Begin => "begin",
            FrameCmd::BeginRenderPass { .. } => "begin_render_pass",
            FrameCmd::BindPipeline => "bind_pipeline",
            FrameCmd::SetViewport(_) => "set_viewport",
            FrameCmd::SetScissor(_) => "set_scissor",
            FrameCmd::Draw { .. } => "draw",
            FrameCmd::EndRenderPass => "end_render_pass",
            FrameCmd::End => "end",
        }
    }

    fn record(extent: vk::Extent2D) -> Vec<FrameCmd> {
        let mut cmds = Vec::new();
        emit_frame_commands(extent, 1, [0.15, 0.15, 0.2, 1.0], &mut |c| -> Result<(), ()> {
            cmds.push(c);
            Ok(())
        })
        .unwrap();
        cmds
    }

    const EXTENT: vk::Extent2D = vk::Extent2D {
        width: 640,
        height: 480,
    };

    #[test]
    fn frame_commands_come_in_the_required_order() {
        let names: Vec<_> = record(EXTENT).iter().map(name).collect();
        assert_eq!(
            names,
            [
                "begin",
                "begin_render_pass",
                "bind_pipeline",
                "set_viewport",
                "set_scissor",
                "draw",
                "end_render_pass",
                "end",
            ]
        );
    }

    #[test]
    fn one_draw_of_three_vertices_one_instance() {
        let cmds = record(EXTENT);
        let draws: Vec<FrameCmd> = cmds
            .into_iter()
            .filter(|c| matches!(c, FrameCmd::Draw { .. }))
            .collect();
        assert_eq!(draws.len(), 1);
        assert!(matches!(
            draws[0],
            FrameCmd::Draw {
                vertex_count: 3,
                instance_count: 1,
            }
        ));
    }

    #[test]
    fn dynamic_state_is_set_once_and_before_the_draw() {
        let cmds = record(EXTENT);
        let position = |wanted: &str| {
            cmds.iter()
                .enumerate()
                .filter(|(_, c)| name(c) == wanted)
                .map(|(i, _)| i)
                .collect::<Vec<_>>()
        };

        let viewports = position("set_viewport");
        let scissors = position("set_scissor");
        let draws = position("draw");
        assert_eq!(viewports.len(), 1);
        assert_eq!(scissors.len(), 1);
        assert!(viewports[0] < draws[0]);
        assert!(scissors[0] < draws[0]);
    }

    #[test]
    fn viewport_and_scissor_cover_the_full_extent() {
        for cmd in record(EXTENT) {
            match cmd {
                FrameCmd::SetViewport(vp) => {
                    assert_eq!(vp.width, 640.0);
                    assert_eq!(vp.height, 480.0);
                    assert_eq!(vp.min_depth, 0.0);
                    assert_eq!(vp.max_depth, 1.0);
                }
                FrameCmd::SetScissor(rect) => {
                    assert_eq!(rect.offset.x, 0);
                    assert_eq!(rect.extent, EXTENT);
                }
                _ => {}
            }
        }
    }

    #[test]
    fn drawing_stays_inside_the_render_pass() {
        let cmds = record(EXTENT);
        let index_of = |wanted: &str| cmds.iter().position(|c| name(c) == wanted).unwrap();
        assert!(index_of("begin_render_pass") < index_of("draw"));
        assert!(index_of("draw") < index_of("end_render_pass"));
        assert!(index_of("end_render_pass") < index_of("end"));
    }

    #[test]
    fn a_failed_emit_aborts_the_rest_of_the_frame() {
        let mut seen = Vec::new();
        let result = emit_frame_commands(EXTENT, 0, [0.0; 4], &mut |c| {
            seen.push(c);
            if matches!(c, FrameCmd::BindPipeline) {
                Err("out of pool memory")
            } else {
                Ok(())
            }
        });
        assert!(result.is_err());
        assert_eq!(seen.iter().map(name).last(), Some("bind_pipeline"));
    }

    #[test]
    fn present_results_classify_as_tagged_outcomes() {
        assert_eq!(classify_present(Ok(false)).unwrap(), FrameOutcome::Presented);
        assert_eq!(classify_present(Ok(true)).unwrap(), FrameOutcome::Presented);
        assert_eq!(
            classify_present(Err(vk::Result::ERROR_OUT_OF_DATE_KHR)).unwrap(),
            FrameOutcome::SurfaceOutOfDate
        );
        assert!(matches!(
            classify_present(Err(vk::Result::ERROR_DEVICE_LOST)),
            Err(RenderError::Frame { .. })
        ));
    }
}
