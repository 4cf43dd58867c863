use hypertext::prelude::*;

pub enum Action<'r> {
    Link {
        href: &'r str,
        label: &'r str,
    },
    /// A button submitting an empty POST form.
    Post {
        action: &'r str,
        label: &'r str,
        class: &'r str,
    },
}

/// A row of buttons.
pub struct Actions<'r> {
    pub options: &'r [Action<'r>],
}

impl<'r> Renderable for Actions<'r> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        maud! {
            div class = "row mt-3 mb-3" {
                @for option in self.options {
                    div class = "col-md-auto" {
                        @match option {
                            Action::Link { href, label } => {
                                a class="btn btn-primary" href=(href) {
                                    (label)
                                }
                            }
                            Action::Post { action, label, class } => {
                                form method="post" action=(action) {
                                    button type="submit" class=(format!("btn {class}")) {
                                        (label)
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
        .render_to(buffer);
    }
}
