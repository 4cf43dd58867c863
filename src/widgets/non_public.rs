use hypertext::prelude::*;

/// Frames content that only administrators can currently see.
pub struct NonPublic<T: Renderable> {
    pub child: T,
    pub title: &'static str,
}

impl<T: Renderable> Renderable for NonPublic<T> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        maud! {
            div class="card bg-light-subtle mb-4" {
                div class="card-header" {
                    h5 class="card-title" {
                       (self.title)
                    }
                    p class="card-subtitle text-muted" {
                        "This roster has not been published. Only administrators can see it."
                    }
                }
                div class="card-body" {
                    (self.child)
                }
            }
        }.render_to(buffer)
    }
}
