use crate::navigation::columns_for_width;
use crate::picker::{Effect, Key, WallpaperPicker};
use crate::scheme::Scheme;
use eframe::egui;
use std::collections::HashMap;

const THUMBNAIL_PADDING: f32 = 4.0;

/// eframe front end: search field, scheme dropdown and the thumbnail grid.
pub struct PickerApp {
    pub picker: WallpaperPicker,
    query: String,
    textures: HashMap<String, (u64, egui::TextureHandle)>,
    columns: usize,
    scheme_menu_open: bool,
    search_id: Option<egui::Id>,
}

impl PickerApp {
    pub fn new(picker: WallpaperPicker) -> Self {
        Self {
            picker,
            query: String::new(),
            textures: HashMap::new(),
            columns: 1,
            scheme_menu_open: false,
            search_id: None,
        }
    }

    fn texture_for(&mut self, ctx: &egui::Context, file_name: &str) -> Option<egui::TextureHandle> {
        let presenter = self.picker.presenter();
        let revision = presenter.revision(file_name)?;

        if let Some((cached_revision, texture)) = self.textures.get(file_name) {
            if *cached_revision == revision {
                return Some(texture.clone());
            }
        }

        let record = presenter.record(file_name)?;
        let size = [record.image.width() as usize, record.image.height() as usize];
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, record.image.as_raw());
        let texture = ctx.load_texture(format!("thumbnail_{}", file_name), color_image, egui::TextureOptions::default());

        self.textures.insert(file_name.to_owned(), (revision, texture.clone()));
        Some(texture)
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        let search_focused = self
            .search_id
            .is_some_and(|id| ctx.memory(|m| m.has_focus(id)));
        let popup_open = ctx.memory(|m| m.any_popup_open());
        if !accepts_grid_keys(search_focused, self.scheme_menu_open, popup_open) {
            return;
        }

        let keys: Vec<(Key, bool)> = ctx.input(|i| {
            i.events
                .iter()
                .filter_map(|event| match event {
                    egui::Event::Key {
                        key,
                        pressed: true,
                        modifiers,
                        ..
                    } => Some((map_key(*key), modifiers.shift)),
                    _ => None,
                })
                .filter(|(key, _)| *key != Key::Other)
                .collect()
        });

        for (key, shift) in keys {
            let outcome = self.picker.handle_key(key, shift, self.columns);
            for effect in outcome.effects {
                self.apply(effect);
            }
        }
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::Activate(activation) => self.picker.dispatch(activation),
            Effect::OpenSchemeMenu => self.scheme_menu_open = true,
            Effect::SchemeChanged(_) => {}
        }
    }

    fn header(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let width = (ui.available_width() - 160.0).max(80.0);
            let search = ui.add(
                egui::TextEdit::singleline(&mut self.query)
                    .hint_text("Search Wallpapers...")
                    .desired_width(width),
            );
            self.search_id = Some(search.id);
            if search.changed() {
                self.picker.set_query(&self.query);
            }
            if !self.scheme_menu_open && ui.memory(|m| m.focused().is_none()) {
                search.request_focus();
            }

            let mut scheme = self.picker.scheme();
            egui::ComboBox::from_id_source("scheme-dropdown")
                .selected_text(scheme.label())
                .show_ui(ui, |ui| {
                    for option in Scheme::ALL {
                        ui.selectable_value(&mut scheme, option, option.label());
                    }
                })
                .response
                .on_hover_text("Select color scheme");
            self.picker.set_scheme(scheme);
        });
    }

    fn scheme_menu(&mut self, ctx: &egui::Context) {
        if !self.scheme_menu_open {
            return;
        }

        let current = self.picker.scheme();
        let mut open = true;
        let mut chosen = None;
        egui::Window::new("Color scheme")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                for option in Scheme::ALL {
                    if ui.selectable_label(option == current, option.label()).clicked() {
                        chosen = Some(option);
                    }
                }
            });

        if let Some(scheme) = chosen {
            self.picker.set_scheme(scheme);
        }
        self.scheme_menu_open = open && chosen.is_none();
    }

    fn grid(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        let item_width = self.picker.config().item_width;
        self.columns = columns_for_width(ui.available_width(), item_width);

        let displayed: Vec<String> = self.picker.presenter().displayed().to_vec();
        let cursor = self.picker.presenter().cursor();
        let scroll_to = self.picker.presenter_mut().take_scroll_request();
        let mut clicked = None;

        egui::ScrollArea::vertical().show(ui, |ui| {
            ui.horizontal_wrapped(|ui| {
                ui.spacing_mut().item_spacing = egui::vec2(THUMBNAIL_PADDING, THUMBNAIL_PADDING);
                for (index, file_name) in displayed.iter().enumerate() {
                    let Some(texture) = self.texture_for(ctx, file_name) else {
                        continue;
                    };
                    let response = ui
                        .add(egui::ImageButton::new(&texture).frame(true).selected(cursor == Some(index)))
                        .on_hover_text(file_name);

                    if scroll_to == Some(index) {
                        response.scroll_to_me(Some(egui::Align::Center));
                    }
                    if response.clicked() {
                        clicked = Some(index);
                    }
                }
            });
        });

        if let Some(activation) = clicked.and_then(|index| self.picker.activate_index(index)) {
            self.picker.dispatch(activation);
        }
    }

    fn drop_stale_textures(&mut self) {
        let presenter = self.picker.presenter();
        self.textures.retain(|name, _| presenter.contains(name));
    }
}

/// Grid navigation keys are only taken while the search field owns the
/// keyboard. Anything else focused (the scheme menu, the dropdown popup) keeps
/// its own arrow and Enter handling.
fn accepts_grid_keys(search_focused: bool, scheme_menu_open: bool, popup_open: bool) -> bool {
    search_focused && !scheme_menu_open && !popup_open
}

fn map_key(key: egui::Key) -> Key {
    match key {
        egui::Key::ArrowUp => Key::Up,
        egui::Key::ArrowDown => Key::Down,
        egui::Key::ArrowLeft => Key::Left,
        egui::Key::ArrowRight => Key::Right,
        egui::Key::Enter => Key::Enter,
        _ => Key::Other,
    }
}

impl eframe::App for PickerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.picker.run_pending() > 0 {
            self.drop_stale_textures();
        }
        self.handle_keys(ctx);

        egui::TopBottomPanel::top("header-box").show(ctx, |ui| self.header(ui));
        self.scheme_menu(ctx);
        egui::CentralPanel::default().show(ctx, |ui| self.grid(ctx, ui));

        // Follow-up publish passes are already queued; come back for them.
        if self.picker.pending_len() > 0 {
            ctx.request_repaint();
        }
    }
}
