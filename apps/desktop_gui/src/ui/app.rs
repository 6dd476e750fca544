use std::{cell::RefCell, collections::VecDeque, rc::Rc, sync::Arc};

use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use shared::{domain::FormField, regions::RegionSet};
use signup_core::{FormController, Notifier};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiEvent};
use crate::controller::orchestration::ChannelSink;

/// Alerts waiting to be shown, oldest first. Each one blocks the form until dismissed.
#[derive(Clone, Default)]
pub struct AlertQueue {
    pending: Rc<RefCell<VecDeque<String>>>,
}

impl AlertQueue {
    fn front(&self) -> Option<String> {
        self.pending.borrow().front().cloned()
    }

    fn dismiss(&self) {
        self.pending.borrow_mut().pop_front();
    }

    fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }
}

impl Notifier for AlertQueue {
    fn alert(&self, message: &str) {
        self.pending.borrow_mut().push_back(message.to_string());
    }
}

pub struct SignupFormApp {
    controller: FormController<AlertQueue, ChannelSink>,
    alerts: AlertQueue,
    ui_rx: Receiver<UiEvent>,
    status: String,
    backend_error: Option<UiError>,
}

impl SignupFormApp {
    pub fn new(
        regions: Arc<RegionSet>,
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
    ) -> Self {
        let alerts = AlertQueue::default();
        Self {
            controller: FormController::new(regions, alerts.clone(), ChannelSink::new(cmd_tx)),
            alerts,
            ui_rx,
            status: "Starting...".to_string(),
            backend_error: None,
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::Error(err) => {
                    tracing::error!(context = err.label(), "{}", err.message());
                    self.status = format!("{} error", err.label());
                    self.backend_error = Some(err);
                }
            }
        }
    }

    fn submit(&mut self) {
        if let Err(err) = self.controller.submit() {
            tracing::debug!(%err, "submission not accepted");
        }
    }

    fn show_form(&mut self, ui: &mut egui::Ui) {
        let mut submit_requested = false;

        egui::Grid::new("signup_form")
            .num_columns(2)
            .spacing([12.0, 10.0])
            .show(ui, |ui| {
                for field in FormField::ALL {
                    ui.label(format!("{}:", field.label()));
                    let mut value = self.controller.form().field(field).to_string();
                    let response = ui.add(
                        egui::TextEdit::singleline(&mut value)
                            .id_salt(field.name())
                            .desired_width(260.0),
                    );
                    if response.changed() {
                        self.controller.update_field(field, value);
                    }
                    if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                        submit_requested = true;
                    }
                    ui.end_row();
                }
            });

        ui.add_space(8.0);
        if ui.button("Submit").clicked() {
            submit_requested = true;
        }
        if submit_requested {
            self.submit();
        }
    }

    fn show_alert(&mut self, ctx: &egui::Context) {
        let Some(message) = self.alerts.front() else {
            return;
        };

        let response = egui::Modal::new(egui::Id::new("signup_alert")).show(ctx, |ui| {
            ui.set_max_width(360.0);
            ui.label(message);
            ui.add_space(8.0);
            ui.vertical_centered(|ui| ui.button("OK").clicked()).inner
        });
        if response.inner || response.should_close() {
            self.alerts.dismiss();
        }
    }
}

impl eframe::App for SignupFormApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Sign up");
            ui.weak("Join the list and help build a greener future.");
            ui.add_space(12.0);
            ui.add_enabled_ui(self.alerts.is_empty(), |ui| self.show_form(ui));
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            if let Some(err) = &self.backend_error {
                ui.colored_label(ui.visuals().error_fg_color, err.message());
            } else {
                ui.weak(&self.status);
            }
        });

        self.show_alert(ctx);
        ctx.request_repaint_after(std::time::Duration::from_millis(250));
    }
}
