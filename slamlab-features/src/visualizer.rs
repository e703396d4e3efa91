use opencv::{core::Mat, prelude::*};
use serde::Deserialize;

use crate::{
    AcceptRatio, CompositeCanvas, DescHandler, FrameSource, HandlerKind, KeyCommand, MatchError, Ui,
};

#[derive(Debug, Clone, Deserialize)]
pub struct MatchVisualizerCfg {
    /// (detector, matcher) names, one composite stripe each
    pub pairings: Vec<(String, String)>,
    pub initial_accept_ratio_tenths: u8,
    pub window_name: String,
    pub display_width: i32,
    pub key_wait_ms: i32,
    pub device_index: i32,
    /// empty frames tolerated while waiting for the first reference frame
    pub seed_attempts: u32,
}

impl Default for MatchVisualizerCfg {
    fn default() -> Self {
        Self {
            pairings: vec![
                (String::from("sift"), String::from("bf")),
                (String::from("surf"), String::from("flann")),
                (String::from("orb"), String::from("flann")),
            ],
            initial_accept_ratio_tenths: 5,
            window_name: String::from("matches"),
            display_width: 1000,
            key_wait_ms: 10,
            device_index: 0,
            seed_attempts: 30,
        }
    }
}

impl MatchVisualizerCfg {
    pub fn finalize(self) -> Result<MatchVisualizer, MatchError> {
        let kinds = self
            .pairings
            .iter()
            .map(|(detector, matcher)| HandlerKind::parse(detector, matcher))
            .collect::<Result<Vec<_>, _>>()?;

        // both sets are built in the same order so index i pairs current with reference
        let current = create_handlers(&kinds)?;
        let reference = create_handlers(&kinds)?;
        log::info!(
            "configured {} handlers: {}",
            kinds.len(),
            kinds
                .iter()
                .map(|k| k.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(MatchVisualizer {
            canvas: CompositeCanvas::new(kinds.len()),
            current,
            reference,
            accept_ratio: AcceptRatio::from_tenths(self.initial_accept_ratio_tenths),
            display_width: self.display_width,
            key_wait_ms: self.key_wait_ms,
            seed_attempts: self.seed_attempts.max(1),
        })
    }
}

fn create_handlers(kinds: &[HandlerKind]) -> Result<Vec<DescHandler>, MatchError> {
    kinds
        .iter()
        .enumerate()
        .map(|(stripe, kind)| Ok(DescHandler::new(*kind)?.with_stripe(stripe)))
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// frames shown
    pub frames: usize,
    /// frames where at least one handler could not update its stripe
    pub skipped: usize,
}

pub struct MatchVisualizer {
    current: Vec<DescHandler>,
    reference: Vec<DescHandler>,
    canvas: CompositeCanvas,
    accept_ratio: AcceptRatio,
    display_width: i32,
    key_wait_ms: i32,
    seed_attempts: u32,
}

impl MatchVisualizer {
    pub fn current(&self) -> &[DescHandler] {
        &self.current
    }

    pub fn reference(&self) -> &[DescHandler] {
        &self.reference
    }

    pub fn canvas(&self) -> &CompositeCanvas {
        &self.canvas
    }

    pub fn accept_ratio(&self) -> AcceptRatio {
        self.accept_ratio
    }

    /// Binds every reference handler to `frame`.
    pub fn rebind_reference(&mut self, frame: &Mat) {
        for handler in self.reference.iter_mut() {
            if let Err(e) = handler.detect_and_compute(frame) {
                log::warn!("reference {} kept its previous frame: {e}", handler.kind());
            }
        }
    }

    /// Runs detection on all current handlers; the result says which succeeded.
    pub fn detect_current(&mut self, frame: &Mat) -> Vec<bool> {
        self.current
            .iter_mut()
            .map(|handler| match handler.detect_and_compute(frame) {
                Ok(()) => true,
                Err(e) => {
                    log::warn!("{} skipped frame: {e}", handler.kind());
                    false
                }
            })
            .collect()
    }

    pub fn handle_key(&mut self, key: Option<i32>, frame: &Mat) -> Control {
        match key.and_then(KeyCommand::from_key) {
            Some(KeyCommand::RebindReference) => {
                log::info!("set fixed reference result");
                self.rebind_reference(frame);
            }
            Some(KeyCommand::IncreaseRatio) => {
                self.accept_ratio.increase();
                log::info!("accept ratio {:.1}", self.accept_ratio.value());
            }
            Some(KeyCommand::DecreaseRatio) => {
                self.accept_ratio.decrease();
                log::info!("accept ratio {:.1}", self.accept_ratio.value());
            }
            Some(KeyCommand::Quit) => return Control::Quit,
            None => {}
        }
        Control::Continue
    }

    /// Matches every current handler against its reference and draws it.
    /// Handlers whose detection failed this frame are left alone.
    /// Returns how many stripes were updated.
    pub fn match_and_draw_all(&mut self, detected: &[bool]) -> usize {
        let mut drawn = 0;
        for (i, (current, reference)) in self
            .current
            .iter_mut()
            .zip(self.reference.iter())
            .enumerate()
        {
            if !detected.get(i).copied().unwrap_or(false) {
                continue;
            }
            match current.match_and_draw(reference, self.accept_ratio, &mut self.canvas) {
                Ok(count) => {
                    log::trace!("{}: {count} matches", current.kind());
                    drawn += 1;
                }
                Err(e) => log::warn!("{} skipped frame: {e}", current.kind()),
            }
        }
        drawn
    }

    /// One iteration on an already captured frame: detect, dispatch `key`, match and draw.
    pub fn step(&mut self, frame: &Mat, key: Option<i32>) -> (Control, usize) {
        let detected = self.detect_current(frame);
        if self.handle_key(key, frame) == Control::Quit {
            return (Control::Quit, 0);
        }
        (Control::Continue, self.match_and_draw_all(&detected))
    }

    /// The composite scaled to the display width.
    pub fn composite(&self) -> Result<Mat, MatchError> {
        self.canvas
            .resulting_img(self.display_width)
            .map_err(MatchError::RenderError)
    }

    /// Grabs until a non-empty frame arrives and binds the references to it.
    /// `Ok(false)` means 'q' was pressed while waiting.
    fn seed_reference<S: FrameSource, U: Ui>(
        &mut self,
        source: &mut S,
        ui: &mut U,
    ) -> Result<bool, MatchError> {
        for attempt in 1..=self.seed_attempts {
            let frame = source.grab()?;
            if !frame.empty() {
                self.rebind_reference(&frame);
                return Ok(true);
            }
            log::debug!(
                "empty first frame from device {} (attempt {attempt})",
                source.device()
            );
            let key = ui.poll_key(self.key_wait_ms)?;
            if key.and_then(KeyCommand::from_key) == Some(KeyCommand::Quit) {
                return Ok(false);
            }
        }
        Err(MatchError::CaptureUnavailable(source.device()))
    }

    /// Drives the loop until 'q'. The first non-empty frame seeds the reference
    /// handlers. `source` and `ui` are dropped before returning, on every path.
    pub fn run<S: FrameSource, U: Ui>(
        &mut self,
        mut source: S,
        mut ui: U,
    ) -> Result<RunSummary, MatchError> {
        let mut summary = RunSummary::default();
        if !self.seed_reference(&mut source, &mut ui)? {
            return Ok(summary);
        }

        loop {
            let frame = source.grab()?;
            if frame.empty() {
                log::warn!("no frame from device {}", source.device());
                summary.skipped += 1;
                let key = ui.poll_key(self.key_wait_ms)?;
                match key.and_then(KeyCommand::from_key) {
                    Some(KeyCommand::Quit) => break,
                    Some(KeyCommand::RebindReference) => {
                        log::warn!("no frame to set as reference")
                    }
                    Some(_) => {
                        self.handle_key(key, &frame);
                    }
                    None => {}
                }
                continue;
            }

            let detected = self.detect_current(&frame);
            let key = ui.poll_key(self.key_wait_ms)?;
            if self.handle_key(key, &frame) == Control::Quit {
                break;
            }
            if self.match_and_draw_all(&detected) < self.current.len() {
                summary.skipped += 1;
            }

            ui.show(&self.composite()?)?;
            summary.frames += 1;
        }

        log::info!(
            "stopped after {} frames ({} skipped)",
            summary.frames,
            summary.skipped
        );
        Ok(summary)
    }
}
