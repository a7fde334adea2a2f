use super::*;
use crate::foundation::core::Canvas;
use crate::foundation::error::ComposerResult;
use crate::layer::module::{Module, ModuleBehavior};
use crate::layer::{Inputs, LayerState};
use crate::render::outcome::RenderResult;

const RED: [u8; 4] = [255, 0, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];

enum Step {
    Fill { color: [u8; 4], x: i32, y: i32, w: u32, h: u32 },
    Skip,
    Fail,
}

struct Scripted {
    step: Step,
    grow_top: u32,
}

impl ModuleBehavior for Scripted {
    fn type_name(&self) -> &'static str {
        "Scripted"
    }

    fn declare_inputs(&mut self, _inputs: &mut Inputs<'_>) -> ComposerResult<()> {
        Ok(())
    }

    fn request_layout(
        &mut self,
        _layer: &LayerState,
        viewport: &mut Viewport,
        _table: &mut crate::param::table::ParamTable,
    ) -> RenderResult<()> {
        viewport.expand(self.grow_top, 0, 0, 0);
        Ok(())
    }

    fn draw(&mut self, _layer: &LayerState, surface: &mut Surface, _cx: &DrawCx<'_>) -> RenderResult<()> {
        match self.step {
            Step::Fill { color, x, y, w, h } => {
                let px = color.repeat((w * h) as usize);
                surface.draw_premul(&px, w, h, x, y, 1.0)?;
                Ok(())
            }
            Step::Skip => Err(RenderAbort::skip("nothing to draw")),
            Step::Fail => Err(RenderAbort::Fail(ComposerError::render("scripted failure"))),
        }
    }
}

fn template(steps: Vec<Step>) -> Template {
    let mut t = Template::new("scripted", Canvas::new(4, 4).unwrap());
    for step in steps {
        let m = Module::new(Box::new(Scripted { step, grow_top: 0 }), t.params_mut()).unwrap();
        t.push_module(m);
    }
    t
}

fn px(frame: &FrameRGBA, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * frame.width + x) * 4) as usize;
    [frame.data[i], frame.data[i + 1], frame.data[i + 2], frame.data[i + 3]]
}

fn top_left_red() -> Step {
    Step::Fill { color: RED, x: 0, y: 0, w: 2, h: 1 }
}

fn full_blue() -> Step {
    Step::Fill { color: BLUE, x: 0, y: 0, w: 4, h: 4 }
}

#[test]
fn skipped_module_is_blank_and_the_rest_draw() {
    let mut t = template(vec![top_left_red(), Step::Skip, full_blue()]);
    let out = Compositor::default()
        .render(&mut t, RenderMode::Export)
        .unwrap();
    assert_eq!(px(&out.frame, 0, 0), RED);
    assert_eq!(px(&out.frame, 3, 3), BLUE);
    assert_eq!(
        out.skipped,
        vec![SkippedModule {
            index: 1,
            reason: "nothing to draw".to_owned()
        }]
    );
    assert!(t.module(1).unwrap().surface().is_blank());
    assert!(!t.module(0).unwrap().surface().is_blank());
}

#[test]
fn failure_aborts_with_partial_frame() {
    let mut t = template(vec![top_left_red(), Step::Fail, full_blue()]);
    let err = Compositor::default()
        .render(&mut t, RenderMode::Export)
        .unwrap_err();
    assert_eq!(err.module, Some(1));
    assert!(err.to_string().contains("at module 1"));
    // Bottom module made it in, the top one never ran.
    assert_eq!(px(&err.partial.frame, 0, 0), BLUE);
    assert!(t.module(0).unwrap().surface().is_blank());
}

#[test]
fn display_mode_paints_checkerboard_behind_transparency() {
    let mut t = Template::new("empty", Canvas::new(10, 10).unwrap());
    let out = Compositor::default()
        .render(&mut t, RenderMode::Display)
        .unwrap();
    let opts = CompositorOpts::default();
    assert_eq!(px(&out.frame, 0, 0), opts.checker_light);
    assert_eq!(px(&out.frame, 5, 0), opts.checker_dark);
    assert_eq!(px(&out.frame, 5, 5), opts.checker_light);
}

#[test]
fn export_mode_uses_clear_color_or_transparency() {
    let mut t = Template::new("empty", Canvas::new(2, 2).unwrap());
    let out = Compositor::default()
        .render(&mut t, RenderMode::Export)
        .unwrap();
    assert!(out.frame.data.iter().all(|&b| b == 0));

    let opts = CompositorOpts::default().with_clear_rgba(Some([10, 20, 30, 255]));
    let out = Compositor::new(opts)
        .render(&mut t, RenderMode::Export)
        .unwrap();
    assert_eq!(px(&out.frame, 1, 1), [10, 20, 30, 255]);
}

#[test]
fn layout_can_grow_the_frame_upward() {
    let mut t = Template::new("grow", Canvas::new(4, 4).unwrap());
    let m = Module::new(
        Box::new(Scripted {
            step: Step::Fill { color: RED, x: 0, y: -2, w: 1, h: 1 },
            grow_top: 2,
        }),
        t.params_mut(),
    )
    .unwrap();
    t.push_module(m);
    let out = Compositor::default()
        .render(&mut t, RenderMode::Export)
        .unwrap();
    assert_eq!((out.frame.width, out.frame.height), (4, 6));
    assert_eq!(out.origin, (0, 2));
    assert_eq!(px(&out.frame, 0, 0), RED);
}

#[test]
fn straight_conversion_unpremultiplies_once() {
    let frame = FrameRGBA {
        width: 1,
        height: 1,
        data: vec![64, 0, 0, 128],
        premultiplied: true,
    };
    let straight = frame.into_straight();
    assert!(!straight.premultiplied);
    assert_eq!(straight.data[3], 128);
    assert!(straight.data[0] >= 127 && straight.data[0] <= 128);
    let again = straight.clone().into_straight();
    assert_eq!(again, straight);
}
