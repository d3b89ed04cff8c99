use rollout_model::ProgressEvent;

/// Sink for progress events, in emission order.
pub trait ProgressOutput {
    fn write_progress(&mut self, event: ProgressEvent);
}

impl ProgressOutput for Vec<ProgressEvent> {
    fn write_progress(&mut self, event: ProgressEvent) {
        self.push(event);
    }
}

impl<T> ProgressOutput for &mut T
where
    T: ProgressOutput + ?Sized,
{
    fn write_progress(&mut self, event: ProgressEvent) {
        (**self).write_progress(event);
    }
}
