//! Page selectors and extraction scripts
//!
//! Site markup changes often; everything that names a DOM node lives here
//! so the state machines never embed selectors inline.

// ===== Login =====

pub const LOGIN_USERNAME: &str = "#username";
pub const LOGIN_PASSWORD: &str = "#password";
pub const LOGIN_SUBMIT: &str = "button[type=submit]";

pub const CHECKPOINT_HEADER: &str = "h1";
pub const CHECKPOINT_EXPLANATION: &str = "h1 ~ p";

// ===== Profile =====

pub const PROFILE_MAIN: &str = ".scaffold-layout__main";

/// First button of the profile's action bar; its label reveals the relationship
pub const PRIMARY_ACTION: &str =
    ".scaffold-layout__main > section > div:nth-child(2) > div:last-child button";

/// Overflow ("More") button next to the primary action
pub const OVERFLOW_MENU: &str =
    ".scaffold-layout__main > section > div:nth-child(2) > div:last-child > div > div:last-child > button";

/// "Connect" entry inside the opened overflow menu
pub const OVERFLOW_CONNECT: &str =
    ".scaffold-layout__main > section > div:nth-child(2) > div:last-child > div > div:last-child > div > div > ul > li:nth-child(3) > div";

pub const INVITE_ACTIONBAR: &str = "#artdeco-modal-outlet > div > div > .artdeco-modal__actionbar";
pub const INVITE_ADD_NOTE: &str =
    "#artdeco-modal-outlet > div > div > .artdeco-modal__actionbar > button:first-child";
pub const INVITE_SEND: &str =
    "#artdeco-modal-outlet > div > div > .artdeco-modal__actionbar > button:nth-child(2)";
pub const INVITE_NOTE: &str = "#custom-message";

pub const MESSAGE_COMPOSER: &str = ".msg-form__contenteditable";
pub const MESSAGE_SEND: &str = ".msg-form__send-button";

// ===== Search =====

pub const SEARCH_RESULT_CARD: &str = ".linked-area";

/// Returns one object per result card: id, link, name, title, location, buttonText
pub const EXTRACT_SEARCH_RESULTS: &str = r#"
(() => {
  const people = [];
  for (const c of document.querySelectorAll('.linked-area')) {
    try {
      const link = c.querySelector('a').href.split('?')[0];
      const text = (sel) => { const n = c.querySelector(sel); return n ? n.textContent.trim() : ''; };
      const button = c.querySelector('button');
      people.push({
        id: link.split('/in/')[1] || null,
        link,
        name: text('.entity-result__title-text > a > span > span:first-child'),
        title: text('.entity-result__primary-subtitle'),
        location: text('.entity-result__secondary-subtitle'),
        buttonText: button ? button.textContent.trim() : null,
      });
    } catch (e) {}
  }
  return people;
})()
"#;

/// Scrolls one step towards the bottom of the page
pub const SCROLL_STEP: &str = "window.scrollBy(0, document.body.scrollHeight); true";

/// Builds the profile extraction script; `show_more` is the label of the expander button
pub fn extract_profile_script(show_more: &str) -> String {
    let label = serde_json::to_string(show_more).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        r#"
(() => {{
  const label = {label};
  for (const b of document.querySelectorAll('button')) {{
    if (b.textContent.trim().startsWith(label)) b.click();
  }}
  const text = (root, sel) => {{ const n = root.querySelector(sel); return n ? n.textContent.trim() : ''; }};
  const main = document.querySelector('.scaffold-layout__main');
  if (!main) return null;
  const action = main.querySelector('section > div:nth-child(2) > div:last-child button');
  const experiences = [];
  for (const item of document.querySelectorAll('#experience ~ div li.artdeco-list__item')) {{
    const spans = item.querySelectorAll('span[aria-hidden=true]');
    experiences.push({{
      title: spans[0] ? spans[0].textContent.trim() : '',
      company: spans[1] ? spans[1].textContent.trim() : '',
      period: spans[2] ? spans[2].textContent.trim() : '',
    }});
  }}
  return {{
    link: window.location.href.split('?')[0],
    name: text(main, 'h1'),
    title: text(main, '.text-body-medium'),
    location: text(main, '.text-body-small.inline'),
    buttonText: action ? action.textContent.trim() : null,
    experiences,
  }};
}})()
"#
    )
}

// ===== Company admin =====

pub const EXTRACT_COMPANY: &str = r#"
(() => {
  const q = (sel) => document.querySelector(sel);
  const title = q('.org-organizational-page-admin-navigation__title');
  if (!title) return null;
  const followers = q('.org-organizational-page-admin-navigation__follower-count');
  const logo = q('.org-organizational-page-admin-navigation__logo');
  const cover = q('.ivm-view-attr__img--centered');
  return {
    name: title.innerText.trim(),
    followerCount: followers ? parseInt(followers.innerText.trim().split(' ')[0].replace(/[,.]/g, ''), 10) || 0 : 0,
    logoUrl: logo ? logo.src : null,
    coverImageUrl: cover ? cover.src : null,
  };
})()
"#;

pub const INVITE_TYPEAHEAD: &str = ".artdeco-typeahead__input";
pub const INVITE_FIRST_CHECKBOX: &str = ".artdeco-typeahead__result .ember-checkbox";
pub const INVITE_CONFIRM: &str = ".invitee-picker__footer > div > button";
