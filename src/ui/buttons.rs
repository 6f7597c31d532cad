use serenity::{
    all::ButtonStyle,
    builder::{CreateActionRow, CreateButton},
};

/// IDs personalizados para los botones
pub mod button_ids {
    pub const SKIP: &str = "queue_skip";
    pub const STOP: &str = "queue_stop";
    pub const QUEUE: &str = "queue_show";
}

/// Controles que acompañan a cada canción agregada
pub fn create_control_buttons() -> Vec<CreateActionRow> {
    let skip_btn = CreateButton::new(button_ids::SKIP)
        .emoji('⏭')
        .label("Saltar")
        .style(ButtonStyle::Primary);

    let stop_btn = CreateButton::new(button_ids::STOP)
        .emoji('⏹')
        .label("Detener")
        .style(ButtonStyle::Danger);

    let queue_btn = CreateButton::new(button_ids::QUEUE)
        .emoji('📋')
        .label("Cola")
        .style(ButtonStyle::Secondary);

    vec![CreateActionRow::Buttons(vec![skip_btn, stop_btn, queue_btn])]
}
