//! Static English and Hindi string tables.
//!
//! The active [`Language`] is an explicit value handed to every screen and
//! renderer; nothing here reads ambient state.

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    English,
    Hindi,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Hindi => "hi",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Language::English => Language::Hindi,
            Language::Hindi => Language::English,
        }
    }

    pub fn strings(self) -> &'static Strings {
        match self {
            Language::English => &EN,
            Language::Hindi => &HI,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "hi" | "hindi" => Ok(Language::Hindi),
            other => Err(anyhow!("unsupported language: {other} (expected en or hi)")),
        }
    }
}

#[derive(Debug)]
pub struct Strings {
    // auth
    pub app_title: &'static str,
    pub tagline: &'static str,
    pub login: &'static str,
    pub signup: &'static str,
    pub logout: &'static str,
    pub email: &'static str,
    pub password: &'static str,
    pub forgot_password: &'static str,
    pub reset_password: &'static str,
    pub send_reset_link: &'static str,
    pub back_to_login: &'static str,
    pub dont_have_account: &'static str,
    pub already_have_account: &'static str,

    // tasks
    pub add_task: &'static str,
    pub edit_task: &'static str,
    pub task_title: &'static str,
    pub task_notes: &'static str,
    pub complete: &'static str,
    pub incomplete: &'static str,
    pub no_tasks: &'static str,
    pub loading_tasks: &'static str,

    // filters
    pub all_tasks: &'static str,
    pub completed_tasks: &'static str,
    pub pending_tasks: &'static str,
    pub search: &'static str,

    // suggestions
    pub ai_generate: &'static str,
    pub your_goal: &'static str,
    pub generating: &'static str,

    // dashboard
    pub total: &'static str,
    pub completed: &'static str,
    pub pending: &'static str,

    // messages
    pub task_added: &'static str,
    pub task_updated: &'static str,
    pub task_deleted: &'static str,
    pub login_success: &'static str,
    pub signup_success: &'static str,
    pub signup_check_email: &'static str,
    pub spam_tip: &'static str,
    pub verify_email_first: &'static str,
    pub email_banner: &'static str,
    pub reset_link_sent: &'static str,
    pub logged_out: &'static str,
    pub error: &'static str,
    pub busy: &'static str,
    pub email_required: &'static str,
    pub password_required: &'static str,
    pub title_required: &'static str,
    pub goal_required: &'static str,
    tasks_generated: &'static str,
}

impl Strings {
    pub fn tasks_generated(&self, count: usize) -> String {
        self.tasks_generated.replace("{n}", &count.to_string())
    }
}

static EN: Strings = Strings {
    app_title: "My Tasks",
    tagline: "Organize your life beautifully",
    login: "Login",
    signup: "Sign Up",
    logout: "Logout",
    email: "Email",
    password: "Password",
    forgot_password: "Forgot Password?",
    reset_password: "Reset Password",
    send_reset_link: "Send Reset Link",
    back_to_login: "Back to Login",
    dont_have_account: "Don't have an account? Sign up",
    already_have_account: "Already have an account? Login",

    add_task: "Add Task",
    edit_task: "Edit Task",
    task_title: "Task Title",
    task_notes: "Notes (optional)",
    complete: "Complete",
    incomplete: "Mark Incomplete",
    no_tasks: "No tasks yet. Create your first task!",
    loading_tasks: "Loading your tasks...",

    all_tasks: "All Tasks",
    completed_tasks: "Completed",
    pending_tasks: "Pending",
    search: "Search tasks...",

    ai_generate: "AI Suggest Tasks",
    your_goal: "What's your goal?",
    generating: "Generating...",

    total: "Total",
    completed: "Completed",
    pending: "Pending",

    task_added: "Task added successfully!",
    task_updated: "Task updated successfully!",
    task_deleted: "Task deleted successfully!",
    login_success: "Welcome back!",
    signup_success: "Account created successfully!",
    signup_check_email: "Account created successfully! Please check your email and click the confirmation link to activate your account.",
    spam_tip: "Tip: Check your spam folder if you don't see the email within a few minutes.",
    verify_email_first: "Please verify your email first! Check your inbox (and spam folder) for the confirmation link.",
    email_banner: "Check your email to confirm your account before logging in.",
    reset_link_sent: "Reset link sent to your email!",
    logged_out: "Logged out successfully",
    error: "Something went wrong. Please try again.",
    busy: "This task is still being saved. Please wait.",
    email_required: "Email is required",
    password_required: "Password is required",
    title_required: "Title is required",
    goal_required: "Please enter your goal",
    tasks_generated: "{n} tasks generated successfully!",
};

static HI: Strings = Strings {
    app_title: "मेरे कार्य",
    tagline: "अपने जीवन को सुंदरता से व्यवस्थित करें",
    login: "लॉगिन",
    signup: "साइन अप करें",
    logout: "लॉग आउट",
    email: "ईमेल",
    password: "पासवर्ड",
    forgot_password: "पासवर्ड भूल गए?",
    reset_password: "पासवर्ड रीसेट करें",
    send_reset_link: "रीसेट लिंक भेजें",
    back_to_login: "लॉगिन पर वापस जाएं",
    dont_have_account: "खाता नहीं है? साइन अप करें",
    already_have_account: "पहले से खाता है? लॉगिन करें",

    add_task: "कार्य जोड़ें",
    edit_task: "कार्य संपादित करें",
    task_title: "कार्य शीर्षक",
    task_notes: "नोट्स (वैकल्पिक)",
    complete: "पूर्ण",
    incomplete: "अपूर्ण चिह्नित करें",
    no_tasks: "अभी तक कोई कार्य नहीं। अपना पहला कार्य बनाएं!",
    loading_tasks: "आपके कार्य लोड हो रहे हैं...",

    all_tasks: "सभी कार्य",
    completed_tasks: "पूर्ण",
    pending_tasks: "लंबित",
    search: "कार्य खोजें...",

    ai_generate: "AI सुझाव कार्य",
    your_goal: "आपका लक्ष्य क्या है?",
    generating: "उत्पन्न हो रहा है...",

    total: "कुल",
    completed: "पूर्ण",
    pending: "लंबित",

    task_added: "कार्य सफलतापूर्वक जोड़ा गया!",
    task_updated: "कार्य सफलतापूर्वक अपडेट किया गया!",
    task_deleted: "कार्य सफलतापूर्वक हटाया गया!",
    login_success: "वापसी पर स्वागत है!",
    signup_success: "खाता सफलतापूर्वक बनाया गया!",
    signup_check_email: "खाता सफलतापूर्वक बनाया गया! कृपया अपना ईमेल जांचें और अपना खाता सक्रिय करने के लिए पुष्टिकरण लिंक पर क्लिक करें।",
    spam_tip: "टिप: यदि आपको कुछ मिनटों के भीतर ईमेल नहीं दिखाई देता है तो अपना स्पैम फ़ोल्डर जांचें।",
    verify_email_first: "कृपया पहले अपना ईमेल सत्यापित करें! पुष्टिकरण लिंक के लिए अपना इनबॉक्स (और स्पैम फ़ोल्डर) जांचें।",
    email_banner: "लॉगिन करने से पहले अपना खाता पुष्टि करने के लिए अपना ईमेल जांचें।",
    reset_link_sent: "रीसेट लिंक आपके ईमेल पर भेज दिया गया!",
    logged_out: "सफलतापूर्वक लॉग आउट हो गए",
    error: "कुछ गलत हो गया। कृपया पुनः प्रयास करें।",
    busy: "यह कार्य अभी सहेजा जा रहा है। कृपया प्रतीक्षा करें।",
    email_required: "ईमेल आवश्यक है",
    password_required: "पासवर्ड आवश्यक है",
    title_required: "शीर्षक आवश्यक है",
    goal_required: "कृपया अपना लक्ष्य दर्ज करें",
    tasks_generated: "{n} कार्य सफलतापूर्वक उत्पन्न हुए!",
};

#[cfg(test)]
mod tests {
    use super::Language;

    #[test]
    fn parses_codes_and_names() {
        assert_eq!("en".parse::<Language>().unwrap(), Language::English);
        assert_eq!(" HI ".parse::<Language>().unwrap(), Language::Hindi);
        assert_eq!("hindi".parse::<Language>().unwrap(), Language::Hindi);
        assert!("fr".parse::<Language>().is_err());
    }

    #[test]
    fn toggle_switches_tables() {
        let lang = Language::English;
        assert_eq!(lang.strings().total, "Total");
        assert_eq!(lang.toggled().strings().total, "कुल");
        assert_eq!(lang.toggled().toggled(), lang);
    }

    #[test]
    fn generated_count_is_interpolated() {
        assert_eq!(
            Language::English.strings().tasks_generated(4),
            "4 tasks generated successfully!"
        );
        assert!(Language::Hindi.strings().tasks_generated(4).starts_with('4'));
    }
}
