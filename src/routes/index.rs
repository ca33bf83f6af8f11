use crate::{
    data::student::RawStudentForm,
    maud_conveniences::{
        error_alert, form_submit_button, simple_form_element, success_alert, title,
    },
    state::StudentFormState,
    submission::{Submission, handle_submission},
};
use axum::{Form, extract::State, http::StatusCode};
use maud::{Markup, html};

fn student_form(values: &RawStudentForm, outcome: Option<&Submission>) -> Markup {
    html! {
        div class="bg-gray-800 shadow-md rounded px-8 pt-6 pb-8 mb-4 w-full max-w-md" {
            (title("Enter Student Details"))

            @match outcome {
                Some(accepted @ Submission::Accepted(_)) => { (success_alert(accepted.message())) }
                Some(rejected @ Submission::Rejected(_)) => { (error_alert(rejected.message())) }
                None => {}
            }

            form method="post" {
                (simple_form_element("name", "Name", true, None, Some(values.name.as_str())))
                (simple_form_element("class", "Class", true, None, Some(values.class_name.as_str())))
                (simple_form_element("roll_no", "Roll No", true, Some("number"), Some(values.roll_no.as_str())))
                (simple_form_element("subject", "Subject", true, None, Some(values.subject.as_str())))
                (form_submit_button(Some("Submit")))
            }
        }
    }
}

pub async fn get_index_route(State(state): State<StudentFormState>) -> Markup {
    state.render(student_form(&RawStudentForm::default(), None))
}

pub async fn post_index_route(
    State(state): State<StudentFormState>,
    Form(form): Form<RawStudentForm>,
) -> (StatusCode, Markup) {
    let outcome = handle_submission(state.store(), &form).await;

    let (status, values) = match &outcome {
        //a stored record starts a fresh form
        Submission::Accepted(_) => (StatusCode::OK, RawStudentForm::default()),
        Submission::Rejected(e) => (e.status_code(), form),
    };

    (status, state.render(student_form(&values, Some(&outcome))))
}
