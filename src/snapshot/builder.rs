use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::database::models::{Edge, Form, Question, QuestionOption};

use super::types::{
    CanvasPosition, FormMetadata, FormSnapshot, SnapshotEdge, SnapshotError, SnapshotOption,
    SnapshotQuestion,
};

/// The live authoring graph of one form, as loaded from the database
#[derive(Debug, Clone)]
pub struct FormGraph {
    pub form: Form,
    pub questions: Vec<Question>,
    pub options: Vec<QuestionOption>,
    pub edges: Vec<Edge>,
}

/// Build a value copy of the form's public content.
///
/// Fails without producing anything if an option or edge points at a question that is
/// not part of the graph, or if a row belongs to another form.
pub fn build_snapshot(graph: &FormGraph) -> Result<FormSnapshot, SnapshotError> {
    let form = &graph.form;

    let mut questions: Vec<&Question> = graph.questions.iter().collect();
    for q in &questions {
        if q.form_id != form.id {
            return Err(SnapshotError::DataIntegrity(format!(
                "question {} belongs to form {}, not {}",
                q.id, q.form_id, form.id
            )));
        }
    }
    questions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

    let known: HashSet<Uuid> = questions.iter().map(|q| q.id).collect();

    let mut options_by_question: HashMap<Uuid, Vec<&QuestionOption>> = HashMap::new();
    for option in &graph.options {
        if !known.contains(&option.question_id) {
            return Err(SnapshotError::DataIntegrity(format!(
                "option {} references missing question {}",
                option.id, option.question_id
            )));
        }
        options_by_question
            .entry(option.question_id)
            .or_default()
            .push(option);
    }

    let mut edges: Vec<&Edge> = graph.edges.iter().collect();
    for edge in &edges {
        if edge.form_id != form.id {
            return Err(SnapshotError::DataIntegrity(format!(
                "edge {} belongs to form {}, not {}",
                edge.id, edge.form_id, form.id
            )));
        }
        for endpoint in [edge.source_question_id, edge.target_question_id] {
            if !known.contains(&endpoint) {
                return Err(SnapshotError::DataIntegrity(format!(
                    "edge {} references missing question {}",
                    edge.id, endpoint
                )));
            }
        }
    }
    edges.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

    let questions = questions
        .into_iter()
        .map(|q| {
            let mut options = options_by_question.remove(&q.id).unwrap_or_default();
            options.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then(a.id.cmp(&b.id)));

            SnapshotQuestion {
                id: q.id,
                question_type: q.question_type,
                title: q.title.clone(),
                description: q.description.clone(),
                required: q.required,
                metadata: q.metadata.clone(),
                position: CanvasPosition {
                    x: q.position_x,
                    y: q.position_y,
                },
                options: options
                    .into_iter()
                    .map(|o| SnapshotOption {
                        id: o.id,
                        label: o.label.clone(),
                        value: o.value.clone(),
                        sort_order: o.sort_order,
                    })
                    .collect(),
            }
        })
        .collect();

    let edges = edges
        .into_iter()
        .map(|e| SnapshotEdge {
            id: e.id,
            source: e.source_question_id,
            target: e.target_question_id,
            condition: e.condition.clone(),
        })
        .collect();

    Ok(FormSnapshot {
        form: FormMetadata {
            name: form.name.clone(),
            description: form.description.clone(),
            theme: form.theme.clone(),
            logo_url: form.logo_url.clone(),
            require_consent: form.require_consent,
            allow_anonymous: form.allow_anonymous,
            password_protected: form.password_protected(),
            page_layout: form.page_layout,
        },
        questions,
        edges,
    })
}
