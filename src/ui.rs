use eframe::{App, Frame, egui};
use egui::{Align2, Color32, RichText};
use rfd::FileDialog;

use crate::app::DownloaderApp;
use crate::catalog::PLACEHOLDER;
use crate::model::LogLevel;

const ATTRIBUTION_TEXT: &str = "© 2025 Rakib Islam";
const ATTRIBUTION_URL: &str = "https://rakibislam22.github.io/pro";

fn log_color(level: LogLevel) -> Color32 {
    match level {
        LogLevel::Info => Color32::LIGHT_GRAY,
        LogLevel::Emphasis => Color32::WHITE,
        LogLevel::Success => Color32::from_rgb(0x22, 0xaa, 0x22),
        LogLevel::Error => Color32::from_rgb(0xff, 0x33, 0x33),
    }
}

/// GUI update loop: apply queued worker requests, then draw
impl App for DownloaderApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.pump();

        egui::TopBottomPanel::bottom("attribution").show(ctx, |ui| {
            ui.hyperlink_to(ATTRIBUTION_TEXT, ATTRIBUTION_URL);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.form(ui);
            ui.separator();
            self.progress_and_log(ui);
        });

        self.loading_window(ctx);
        self.quality_window(ctx);
        self.chooser_window(ctx);
    }
}

impl DownloaderApp {
    fn form(&mut self, ui: &mut egui::Ui) {
        // URL row; Enter in the field fetches too
        ui.horizontal(|ui| {
            let field = ui.add(
                egui::TextEdit::singleline(&mut self.url_input)
                    .hint_text("Paste video URL here (YouTube, Vimeo, etc.)")
                    .desired_width(ui.available_width() - 150.0),
            );
            let submitted = field.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("Fetch Qualities").clicked() || submitted {
                self.fetch_qualities();
            }
        });

        // Quality dropdown
        let selected = self.state.selected_quality().unwrap_or(PLACEHOLDER).to_string();
        let mut picked = None;
        egui::ComboBox::from_id_source("quality")
            .selected_text(selected.as_str())
            .width(ui.available_width())
            .show_ui(ui, |ui| {
                for entry in self.state.catalog() {
                    if ui.selectable_label(*entry == selected, entry.as_str()).clicked() {
                        picked = Some(entry.clone());
                    }
                }
            });
        if let Some(entry) = picked {
            self.choose_quality(&entry);
        }

        // Folder row
        ui.horizontal(|ui| {
            ui.label("Save to:");
            ui.add(egui::TextEdit::singleline(&mut self.path_input).desired_width(ui.available_width() - 80.0));
            if ui.button("Browse").clicked() {
                self.open_dir_chooser();
            }
        });

        if ui.add_sized([ui.available_width(), 32.0], egui::Button::new("Download")).clicked() {
            self.start_download();
        }
    }

    fn progress_and_log(&self, ui: &mut egui::Ui) {
        ui.add(egui::ProgressBar::new(self.state.progress()).show_percentage());
        ui.label(self.state.status());
        ui.separator();

        egui::ScrollArea::vertical().auto_shrink([false; 2]).show(ui, |ui| {
            for entry in self.state.log() {
                let mut text = RichText::new(&entry.text).color(log_color(entry.level));
                if entry.level == LogLevel::Emphasis {
                    text = text.strong();
                }
                ui.label(text);
            }
        });
    }

    fn loading_window(&self, ctx: &egui::Context) {
        if !self.state.is_loading() {
            return;
        }
        egui::Window::new("Loading")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Fetching qualities...\nPlease wait.");
                });
            });
    }

    fn quality_window(&mut self, ctx: &egui::Context) {
        if !self.state.quality_popup_open() || self.state.is_loading() {
            return;
        }
        let mut open = true;
        let mut picked = None;
        egui::Window::new("Select Video Quality")
            .collapsible(false)
            .open(&mut open)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().max_height(240.0).show(ui, |ui| {
                    for entry in self.state.catalog() {
                        let chosen = self.state.selected_quality() == Some(entry.as_str());
                        if ui.selectable_label(chosen, entry.as_str()).clicked() {
                            picked = Some(entry.clone());
                        }
                    }
                });
            });
        if let Some(entry) = picked {
            self.choose_quality(&entry);
        } else if !open {
            self.state.close_quality_popup();
        }
    }

    fn chooser_window(&mut self, ctx: &egui::Context) {
        let Some(chooser) = self.chooser.as_mut() else {
            return;
        };

        let mut select = false;
        let mut cancel = false;
        egui::Window::new("Select Download Folder")
            .collapsible(false)
            .default_size([520.0, 400.0])
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    if ui.button("⬆").clicked() {
                        chooser.up();
                    }
                    ui.label(chooser.location().display().to_string());
                });
                ui.separator();

                let mut enter = None;
                let mut pick = None;
                egui::ScrollArea::vertical().max_height(280.0).show(ui, |ui| {
                    for entry in chooser.entries() {
                        let label = if entry.is_dir { format!("📁 {}", entry.name) } else { entry.name.clone() };
                        let chosen = chooser.selection() == Some(entry.path.as_path());
                        let row = ui.selectable_label(chosen, label);
                        if row.double_clicked() && entry.is_dir {
                            enter = Some(entry.path.clone());
                        } else if row.clicked() {
                            pick = Some(entry.path.clone());
                        }
                    }
                });
                if let Some(path) = enter {
                    chooser.enter(&path);
                } else if let Some(path) = pick {
                    chooser.select(path);
                }

                ui.separator();
                ui.horizontal(|ui| {
                    select = ui.add_enabled(chooser.selection().is_some(), egui::Button::new("Select")).clicked();
                    cancel = ui.button("Cancel").clicked();
                    if ui.button("System dialog…").clicked() {
                        if let Some(folder) = FileDialog::new().set_directory(chooser.location()).pick_folder() {
                            chooser.select(folder);
                        }
                    }
                });
            });

        if cancel {
            self.cancel_dir_chooser();
        } else if select {
            self.confirm_dir_chooser();
        }
    }
}
