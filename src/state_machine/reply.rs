//! Outbound messages, keyboards and the bot's fixed vocabulary

use crate::candidate::Candidate;
use crate::criteria::{City, Criteria, Gender};

/// Button labels. Incoming text is matched against these exactly.
pub mod labels {
    pub const GREET: &str = "Начать";
    pub const START: &str = "Начать подбор";
    pub const FINISH: &str = "Завершить";
    pub const RIGHT_CITY: &str = "Да, верно";
    pub const MODIFY_CITY: &str = "Изменить город";
    pub const BOY: &str = "Парень";
    pub const GIRL: &str = "Девушка";
    pub const ALL_TRUE: &str = "Все верно";
    pub const CHANGE_PARAMETERS: &str = "Изменить параметры";
    pub const CITY: &str = "Город";
    pub const AGE: &str = "Возраст";
    pub const GENDER: &str = "Пол";
    pub const NEXT: &str = "Следующий";
    pub const ADD_FAVORITE: &str = "Добавить в избранное";
    pub const FAVORITES: &str = "Избранное";
    pub const CLEAR_FAVORITES: &str = "Очистить избранное";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonColor {
    Primary,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub color: ButtonColor,
}

/// Reply keyboard, row by row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyboard {
    pub one_time: bool,
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    fn one_time() -> Self {
        Self {
            one_time: true,
            rows: vec![vec![]],
        }
    }

    fn button(mut self, label: &str, color: ButtonColor) -> Self {
        if let Some(row) = self.rows.last_mut() {
            row.push(Button {
                label: label.to_string(),
                color,
            });
        }
        self
    }

    fn primary(self, label: &str) -> Self {
        self.button(label, ButtonColor::Primary)
    }

    fn line(mut self) -> Self {
        self.rows.push(vec![]);
        self
    }

    /// Every keyboard ends with a finish button on its own line
    fn with_finish(self) -> Self {
        let kb = if self.rows.iter().all(Vec::is_empty) {
            self
        } else {
            self.line()
        };
        kb.button(labels::FINISH, ButtonColor::Negative)
    }

    /// All labels, in display order
    #[allow(dead_code)] // Used in tests
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().flatten().map(|b| b.label.as_str())
    }
}

/// A message to deliver to one user
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OutgoingMessage {
    pub text: String,
    pub keyboard: Option<Keyboard>,
    /// Photos to fetch and attach
    pub photo_urls: Vec<String>,
    /// Already-uploaded attachment ids, e.g. `photo-1_2`
    pub attachments: Vec<String>,
}

impl OutgoingMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

// ============================================================================
// Prompts
// ============================================================================

pub fn greeting(banner: Option<&str>) -> OutgoingMessage {
    let mut msg = OutgoingMessage::text(
        "Привет! Я - бот VKinder, который поможет тебе подобрать пару.",
    )
    .with_keyboard(
        Keyboard::one_time()
            .primary(labels::START)
            .button(labels::FINISH, ButtonColor::Negative),
    );
    msg.attachments.extend(banner.map(String::from));
    msg
}

pub fn farewell() -> OutgoingMessage {
    OutgoingMessage::text("До новых встреч!")
}

pub fn ask_city() -> OutgoingMessage {
    OutgoingMessage::text("Введите город для поиска:").with_keyboard(Keyboard::one_time().with_finish())
}

pub fn invalid_city() -> OutgoingMessage {
    OutgoingMessage::text(
        "Название города может содержать только буквы, пробелы и дефисы. Введите город ещё раз:",
    )
    .with_keyboard(Keyboard::one_time().with_finish())
}

pub fn confirm_city(city: &City) -> OutgoingMessage {
    OutgoingMessage::text(format!("Начать поиск в городе {city}?")).with_keyboard(
        Keyboard::one_time()
            .primary(labels::RIGHT_CITY)
            .primary(labels::MODIFY_CITY)
            .with_finish(),
    )
}

pub fn ask_gender() -> OutgoingMessage {
    OutgoingMessage::text("Кто вам нужен?").with_keyboard(
        Keyboard::one_time()
            .primary(Gender::Male.label())
            .primary(Gender::Female.label())
            .with_finish(),
    )
}

pub fn ask_age() -> OutgoingMessage {
    OutgoingMessage::text("Укажите возраст:").with_keyboard(Keyboard::one_time().with_finish())
}

pub fn invalid_age() -> OutgoingMessage {
    OutgoingMessage::text("Пожалуйста, введите корректный возраст")
        .with_keyboard(Keyboard::one_time().with_finish())
}

pub fn confirm_data(criteria: &Criteria) -> OutgoingMessage {
    OutgoingMessage::text(format!(
        "Требуется {} из города {} возраст {}?",
        criteria.gender.label().to_lowercase(),
        criteria.city,
        criteria.age
    ))
    .with_keyboard(
        Keyboard::one_time()
            .primary(labels::ALL_TRUE)
            .primary(labels::CHANGE_PARAMETERS)
            .with_finish(),
    )
}

pub fn ask_modify_field() -> OutgoingMessage {
    OutgoingMessage::text("Что изменить?").with_keyboard(
        Keyboard::one_time()
            .primary(labels::CITY)
            .primary(labels::AGE)
            .primary(labels::GENDER)
            .with_finish(),
    )
}

pub fn searching() -> OutgoingMessage {
    OutgoingMessage::text("Ищу подходящие анкеты...")
}

pub fn no_matches() -> OutgoingMessage {
    OutgoingMessage::text("Не найдено пользователей по данным параметрам.")
}

/// Profile card with photos attached
pub fn candidate_card(candidate: &Candidate) -> OutgoingMessage {
    OutgoingMessage {
        text: candidate.card_text(),
        keyboard: None,
        photo_urls: candidate.photos.clone(),
        attachments: vec![],
    }
}

pub fn navigation() -> OutgoingMessage {
    OutgoingMessage::text("-----------------готово----------------").with_keyboard(
        Keyboard::one_time()
            .primary(labels::NEXT)
            .primary(labels::ADD_FAVORITE)
            .primary(labels::FAVORITES)
            .with_finish(),
    )
}

pub fn favorite_added() -> OutgoingMessage {
    OutgoingMessage::text("Пользователь добавлен в избранное")
}

pub fn no_favorites() -> OutgoingMessage {
    OutgoingMessage::text("Избранных пользователей нет.")
}

pub fn favorites_end() -> OutgoingMessage {
    OutgoingMessage::text("--------------конец списка-------------").with_keyboard(
        Keyboard::one_time()
            .primary(labels::NEXT)
            .primary(labels::FAVORITES)
            .button(labels::CLEAR_FAVORITES, ButtonColor::Negative)
            .with_finish(),
    )
}

pub fn favorites_cleared() -> OutgoingMessage {
    OutgoingMessage::text("Избранное очищено.")
}

pub fn apology() -> OutgoingMessage {
    OutgoingMessage::text("Произошла ошибка, попробуйте ещё раз.")
}
